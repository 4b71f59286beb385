//! Explicit, dependency-ordered assembly of the plugins.
//! 以相依順序明確組裝各外掛的工作台。

use pathdock_pythonpath::{FsProbe, OsFsProbe, PathChange, PrecedenceMap, PythonpathError};
use pathdock_settings::ConfigStore;
use thiserror::Error;
use tracing::{debug, info};

use crate::console::{ConsoleError, ConsoleHub, ShellConnect, ShellId};
use crate::plugin::{Plugin, PluginId};
use crate::preferences::PreferencesRegistry;
use crate::pythonpath_manager::PythonpathManager;
use crate::startup::{resolve_startup_order, StartupError};
use crate::variable_explorer::VariableExplorer;

/// 工作台的錯誤。 / Errors raised while driving the workbench.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Pythonpath(#[from] PythonpathError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("plugin {0} has not been started")]
    NotStarted(PluginId),
}

/// Owns every plugin and wires them together once their dependencies are up.
///
/// `start` initializes the plugins in dependency order and, right after a
/// plugin starts, runs the availability hooks between it and each plugin
/// that is already running. `shutdown` tears down in reverse order.
pub struct Workbench<C, P = OsFsProbe> {
    preferences: PreferencesRegistry,
    console: ConsoleHub,
    pythonpath: PythonpathManager<C, P>,
    variable_explorer: VariableExplorer,
    started: Vec<PluginId>,
}

impl<C: ConfigStore, P: FsProbe> Workbench<C, P> {
    pub fn new(pythonpath: PythonpathManager<C, P>) -> Self {
        Self {
            preferences: PreferencesRegistry::new(),
            console: ConsoleHub::new(),
            pythonpath,
            variable_explorer: VariableExplorer::new(),
            started: Vec::new(),
        }
    }

    fn plugins(&self) -> [&dyn Plugin; 4] {
        [
            &self.preferences,
            &self.console,
            &self.pythonpath,
            &self.variable_explorer,
        ]
    }

    pub fn startup_order(&self) -> Result<Vec<PluginId>, StartupError> {
        resolve_startup_order(&self.plugins())
    }

    pub fn plugin_name(&self, id: PluginId) -> Option<&'static str> {
        self.plugins()
            .into_iter()
            .find(|plugin| plugin.id() == id)
            .map(|plugin| plugin.name())
    }

    /// 依序啟動外掛。 / Starts every plugin in dependency order.
    pub fn start(&mut self) -> Result<(), WorkbenchError> {
        for id in self.startup_order()? {
            self.initialize(id)?;
            let running = self.started.clone();
            self.started.push(id);
            for other in running {
                self.wire(id, other);
                self.wire(other, id);
            }
            info!(plugin = %id, "plugin started");
        }
        Ok(())
    }

    /// 依反向順序停止外掛。 / Stops the running plugins in reverse order.
    pub fn shutdown(&mut self) -> Result<(), WorkbenchError> {
        while let Some(id) = self.started.pop() {
            match id {
                PluginId::VariableExplorer => self.variable_explorer.unregister(),
                PluginId::PythonpathManager => self.pythonpath.on_close()?,
                _ => {}
            }
            debug!(plugin = %id, "plugin stopped");
        }
        Ok(())
    }

    pub fn is_started(&self, id: PluginId) -> bool {
        self.started.contains(&id)
    }

    pub fn preferences(&self) -> &PreferencesRegistry {
        &self.preferences
    }

    pub fn console(&self) -> &ConsoleHub {
        &self.console
    }

    pub fn pythonpath(&self) -> &PythonpathManager<C, P> {
        &self.pythonpath
    }

    pub fn variable_explorer(&self) -> &VariableExplorer {
        &self.variable_explorer
    }

    pub fn open_project(&mut self, path: &str) -> Result<Option<PathChange>, WorkbenchError> {
        self.ensure_started(PluginId::PythonpathManager)?;
        let change = self.pythonpath.open_project(path)?;
        self.propagate(change.as_ref());
        Ok(change)
    }

    pub fn close_project(&mut self) -> Result<Option<PathChange>, WorkbenchError> {
        self.ensure_started(PluginId::PythonpathManager)?;
        let change = self.pythonpath.close_project()?;
        self.propagate(change.as_ref());
        Ok(change)
    }

    pub fn update_pythonpath(
        &mut self,
        user_map: &PrecedenceMap,
    ) -> Result<Option<PathChange>, WorkbenchError> {
        self.ensure_started(PluginId::PythonpathManager)?;
        let change = self.pythonpath.apply_update(user_map)?;
        self.propagate(change.as_ref());
        Ok(change)
    }

    pub fn create_shell(&mut self) -> Result<ShellId, WorkbenchError> {
        self.ensure_started(PluginId::IPythonConsole)?;
        let shell = self.console.create_shell();
        self.sync_console()?;
        Ok(shell)
    }

    pub fn connect_external_kernel(&mut self) -> Result<ShellId, WorkbenchError> {
        self.ensure_started(PluginId::IPythonConsole)?;
        let shell = self.console.connect_external_kernel();
        self.sync_console()?;
        Ok(shell)
    }

    pub fn set_current_shell(&mut self, shell: ShellId) -> Result<(), WorkbenchError> {
        self.console.set_current_shell(shell)?;
        self.sync_console()
    }

    pub fn close_shell(&mut self, shell: ShellId) -> Result<(), WorkbenchError> {
        self.console.close_shell(shell)?;
        self.sync_console()
    }

    fn initialize(&mut self, id: PluginId) -> Result<(), WorkbenchError> {
        match id {
            PluginId::PythonpathManager => self.pythonpath.on_initialize()?,
            PluginId::VariableExplorer => {
                let config = self.pythonpath.resolver().config();
                self.variable_explorer.load_settings(config);
            }
            _ => {}
        }
        Ok(())
    }

    /// Availability hook of `consumer` for `provider`.
    fn wire(&mut self, consumer: PluginId, provider: PluginId) {
        match (consumer, provider) {
            (PluginId::VariableExplorer, PluginId::Preferences) => {
                self.variable_explorer
                    .on_preferences_available(&mut self.preferences);
            }
            (PluginId::VariableExplorer, PluginId::IPythonConsole) => {
                self.variable_explorer.on_console_available(&mut self.console);
            }
            (PluginId::IPythonConsole, PluginId::PythonpathManager) => {
                self.console
                    .set_search_path(self.pythonpath.get_spyder_pythonpath());
            }
            _ => {}
        }
    }

    fn propagate(&mut self, change: Option<&PathChange>) {
        if let Some(change) = change {
            if self.is_started(PluginId::IPythonConsole) {
                self.console.on_pythonpath_changed(change);
            }
        }
    }

    fn sync_console(&mut self) -> Result<(), WorkbenchError> {
        self.variable_explorer
            .process_console_events(&mut self.console)?;
        Ok(())
    }

    fn ensure_started(&self, id: PluginId) -> Result<(), WorkbenchError> {
        if self.is_started(id) {
            Ok(())
        } else {
            Err(WorkbenchError::NotStarted(id))
        }
    }
}
