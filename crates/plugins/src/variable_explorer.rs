use std::sync::mpsc::Receiver;

use pathdock_settings::ConfigStore;
use tracing::debug;

use crate::console::{
    ConsoleError, ConsoleHub, NamespaceViewSettings, ShellConnect, ShellEvent, ShellId,
};
use crate::plugin::{Plugin, PluginId};
use crate::preferences::{ConfigPage, PreferencesRegistry};

/// 顯示目前主控台 shell 命名空間的停駐外掛。 / Dockable plugin showing the namespace of the current console shell.
#[derive(Debug, Default)]
pub struct VariableExplorer {
    settings: NamespaceViewSettings,
    browsers: Vec<ShellId>,
    current: Option<ShellId>,
    console_events: Option<Receiver<ShellEvent>>,
}

impl VariableExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reloads the namespace view settings from the plugin's section.
    pub fn load_settings(&mut self, config: &dyn ConfigStore) {
        self.settings = NamespaceViewSettings::from_config(config, PluginId::VariableExplorer.as_str());
    }

    pub fn settings(&self) -> &NamespaceViewSettings {
        &self.settings
    }

    pub fn config_page(&self) -> ConfigPage {
        ConfigPage::new(self.id(), self.name())
    }

    pub fn on_preferences_available(&self, preferences: &mut PreferencesRegistry) {
        preferences.register_plugin_preferences(self.config_page());
    }

    pub fn on_console_available(&mut self, console: &mut ConsoleHub) {
        self.register_console(console);
    }

    pub fn unregister(&mut self) {
        self.unregister_console();
        self.browsers.clear();
        self.current = None;
    }

    pub fn is_connected(&self) -> bool {
        self.console_events.is_some()
    }

    /// Shell whose namespace is displayed at the moment.
    pub fn current_shell(&self) -> Option<ShellId> {
        self.current
    }

    /// Shells with a namespace browser, in creation order.
    pub fn shells(&self) -> &[ShellId] {
        &self.browsers
    }
}

impl ShellConnect for VariableExplorer {
    fn set_shell(&mut self, shell: ShellId) {
        if self.browsers.contains(&shell) {
            self.current = Some(shell);
        }
    }

    fn add_shell(&mut self, shell: ShellId) {
        if !self.browsers.contains(&shell) {
            self.browsers.push(shell);
        }
    }

    fn remove_shell(&mut self, shell: ShellId) {
        self.browsers.retain(|existing| *existing != shell);
        if self.current == Some(shell) {
            self.current = None;
        }
    }

    fn on_external_kernel_connected(
        &mut self,
        shell: ShellId,
        console: &mut ConsoleHub,
    ) -> Result<(), ConsoleError> {
        debug!(%shell, "sending namespace view settings to external kernel");
        console.set_namespace_view_settings(shell, self.settings.clone())?;
        console.refresh_namespace_browser(shell)
    }

    fn console_events(&mut self) -> &mut Option<Receiver<ShellEvent>> {
        &mut self.console_events
    }
}

impl Plugin for VariableExplorer {
    fn id(&self) -> PluginId {
        PluginId::VariableExplorer
    }

    fn name(&self) -> &'static str {
        "Variable explorer"
    }

    fn description(&self) -> &'static str {
        "Display, explore load and save variables in the current namespace."
    }

    fn requires(&self) -> &'static [PluginId] {
        &[PluginId::IPythonConsole, PluginId::Preferences]
    }
}
