use std::fmt;

/// 工作台中各外掛的識別碼。 / Identifiers of the plugins that make up the workbench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginId {
    Appearance,
    Application,
    Shortcuts,
    MainInterpreter,
    Preferences,
    IPythonConsole,
    PythonpathManager,
    VariableExplorer,
}

impl PluginId {
    /// Stable name, also used as the plugin's configuration section.
    pub fn as_str(self) -> &'static str {
        match self {
            PluginId::Appearance => "appearance",
            PluginId::Application => "application",
            PluginId::Shortcuts => "shortcuts",
            PluginId::MainInterpreter => "main_interpreter",
            PluginId::Preferences => "preferences",
            PluginId::IPythonConsole => "ipython_console",
            PluginId::PythonpathManager => "pythonpath_manager",
            PluginId::VariableExplorer => "variable_explorer",
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 每個外掛提供給啟動流程的靜態描述。 / Static description every plugin provides to the startup sequence.
pub trait Plugin {
    fn id(&self) -> PluginId;

    /// Human readable name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Plugins that must be started before this one.
    fn requires(&self) -> &'static [PluginId] {
        &[]
    }
}
