use crate::plugin::{Plugin, PluginId};

/// 偏好設定對話框中優先顯示的頁面。 / Plugins whose pages are listed first in the preferences dialog.
pub const MOST_IMPORTANT_PAGES: [PluginId; 4] = [
    PluginId::Appearance,
    PluginId::Application,
    PluginId::Shortcuts,
    PluginId::MainInterpreter,
];

/// 偏好設定外掛的動作。 / Actions exposed by the preferences plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferencesAction {
    Show,
    Reset,
}

impl PreferencesAction {
    pub const ALL: [PreferencesAction; 2] = [PreferencesAction::Show, PreferencesAction::Reset];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferencesAction::Show => "show_action",
            PreferencesAction::Reset => "reset_action",
        }
    }
}

/// 外掛提供的設定頁面。 / Configuration page contributed by a plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPage {
    pub plugin: PluginId,
    pub title: String,
}

impl ConfigPage {
    pub fn new(plugin: PluginId, title: impl Into<String>) -> Self {
        Self {
            plugin,
            title: title.into(),
        }
    }
}

/// 收集其他外掛的設定頁面。 / Collects the configuration pages of the other plugins.
#[derive(Debug, Clone, Default)]
pub struct PreferencesRegistry {
    pages: Vec<ConfigPage>,
}

impl PreferencesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `page`, replacing an earlier page of the same plugin in place.
    pub fn register_plugin_preferences(&mut self, page: ConfigPage) {
        match self.pages.iter_mut().find(|existing| existing.plugin == page.plugin) {
            Some(existing) => *existing = page,
            None => self.pages.push(page),
        }
    }

    pub fn deregister_plugin_preferences(&mut self, plugin: PluginId) -> bool {
        let before = self.pages.len();
        self.pages.retain(|page| page.plugin != plugin);
        before != self.pages.len()
    }

    pub fn is_registered(&self, plugin: PluginId) -> bool {
        self.pages.iter().any(|page| page.plugin == plugin)
    }

    /// Pages in display order: the most important ones (in their fixed
    /// order) followed by the others in registration order.
    pub fn pages(&self) -> Vec<&ConfigPage> {
        let important = MOST_IMPORTANT_PAGES
            .iter()
            .filter_map(|id| self.pages.iter().find(|page| page.plugin == *id));
        let rest = self
            .pages
            .iter()
            .filter(|page| !MOST_IMPORTANT_PAGES.contains(&page.plugin));
        important.chain(rest).collect()
    }
}

impl Plugin for PreferencesRegistry {
    fn id(&self) -> PluginId {
        PluginId::Preferences
    }

    fn name(&self) -> &'static str {
        "Preferences"
    }

    fn description(&self) -> &'static str {
        "Manage the configuration pages of every plugin."
    }
}
