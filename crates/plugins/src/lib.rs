//! Plugin wiring for pathdock: preferences pages, the console hub, the
//! PYTHONPATH manager and the variable explorer, started in dependency order.
//! pathdock 的外掛組裝：偏好設定頁、主控台、PYTHONPATH 管理與變數瀏覽器。

pub mod console;
pub mod plugin;
pub mod preferences;
pub mod pythonpath_manager;
pub mod startup;
pub mod variable_explorer;
pub mod workbench;

pub use console::{
    ConsoleError, ConsoleHub, NamespaceViewSettings, ShellConnect, ShellEvent, ShellId,
    ShellState,
};
pub use plugin::{Plugin, PluginId};
pub use preferences::{ConfigPage, PreferencesAction, PreferencesRegistry, MOST_IMPORTANT_PAGES};
pub use pythonpath_manager::PythonpathManager;
pub use startup::{resolve_startup_order, StartupError};
pub use variable_explorer::VariableExplorer;
pub use workbench::{Workbench, WorkbenchError};
