//! Console subsystem: shells, their search path, and the events other
//! plugins listen to.
//! 主控台子系統：shell、其搜尋路徑，以及供其他外掛訂閱的事件。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use pathdock_pythonpath::PathChange;
use pathdock_settings::ConfigStore;
use thiserror::Error;
use tracing::{debug, warn};

use crate::plugin::{Plugin, PluginId};

/// 主控台 shell 的識別碼。 / Identifier of a console shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShellId(u64);

impl fmt::Display for ShellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shell-{}", self.0)
    }
}

/// shell 生命週期事件。 / Lifecycle notifications published by [`ConsoleHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    Created(ShellId),
    /// The current shell changed.
    Changed(ShellId),
    Deleted(ShellId),
    ExternalKernelConnected(ShellId),
}

/// 主控台操作的錯誤。 / Errors raised by console operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown console shell {0}")]
    UnknownShell(ShellId),
}

/// 核心回報命名空間時套用的篩選設定。 / Filters applied when a kernel reports its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceViewSettings {
    pub exclude_private: bool,
    pub exclude_uppercase: bool,
    pub exclude_capitalized: bool,
    pub exclude_unsupported: bool,
    pub exclude_callables_and_modules: bool,
    pub show_minmax: bool,
}

impl Default for NamespaceViewSettings {
    fn default() -> Self {
        Self {
            exclude_private: true,
            exclude_uppercase: false,
            exclude_capitalized: false,
            exclude_unsupported: false,
            exclude_callables_and_modules: true,
            show_minmax: false,
        }
    }
}

impl NamespaceViewSettings {
    /// Reads the settings from `section`, falling back to the defaults per option.
    pub fn from_config(config: &dyn ConfigStore, section: &str) -> Self {
        let defaults = Self::default();
        Self {
            exclude_private: config.get_bool(section, "exclude_private", defaults.exclude_private),
            exclude_uppercase: config.get_bool(
                section,
                "exclude_uppercase",
                defaults.exclude_uppercase,
            ),
            exclude_capitalized: config.get_bool(
                section,
                "exclude_capitalized",
                defaults.exclude_capitalized,
            ),
            exclude_unsupported: config.get_bool(
                section,
                "exclude_unsupported",
                defaults.exclude_unsupported,
            ),
            exclude_callables_and_modules: config.get_bool(
                section,
                "exclude_callables_and_modules",
                defaults.exclude_callables_and_modules,
            ),
            show_minmax: config.get_bool(section, "minmax", defaults.show_minmax),
        }
    }
}

/// 每個 shell 的狀態。 / State kept for each shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellState {
    pub sys_path: Vec<String>,
    pub external_kernel: bool,
    pub namespace_view: Option<NamespaceViewSettings>,
    pub namespace_refreshes: usize,
}

/// 擁有所有 shell 的主控台外掛。 / Console plugin owning every shell.
#[derive(Debug, Default)]
pub struct ConsoleHub {
    shells: BTreeMap<ShellId, ShellState>,
    current: Option<ShellId>,
    next_shell: u64,
    search_path: Vec<String>,
    subscribers: Vec<Sender<ShellEvent>>,
}

impl ConsoleHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to shell events; dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<ShellEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Starts a new shell and makes it the current one.
    pub fn create_shell(&mut self) -> ShellId {
        self.spawn(false)
    }

    /// Connects to an external kernel through a new shell.
    pub fn connect_external_kernel(&mut self) -> ShellId {
        let id = self.spawn(true);
        self.publish(ShellEvent::ExternalKernelConnected(id));
        id
    }

    /// 切換目前的 shell。 / Makes `id` the current shell.
    pub fn set_current_shell(&mut self, id: ShellId) -> Result<(), ConsoleError> {
        if !self.shells.contains_key(&id) {
            return Err(ConsoleError::UnknownShell(id));
        }
        if self.current != Some(id) {
            self.current = Some(id);
            self.publish(ShellEvent::Changed(id));
        }
        Ok(())
    }

    /// Closes a shell; the most recent remaining shell becomes current.
    pub fn close_shell(&mut self, id: ShellId) -> Result<(), ConsoleError> {
        self.shells
            .remove(&id)
            .ok_or(ConsoleError::UnknownShell(id))?;
        self.publish(ShellEvent::Deleted(id));
        if self.current == Some(id) {
            self.current = self.shells.keys().next_back().copied();
            if let Some(next) = self.current {
                self.publish(ShellEvent::Changed(next));
            }
        }
        Ok(())
    }

    /// 目前的 shell。 / Shell that currently has focus.
    pub fn current_shell(&self) -> Option<ShellId> {
        self.current
    }

    /// 查詢 shell 狀態。 / State of shell `id`, if it is open.
    pub fn shell(&self, id: ShellId) -> Option<&ShellState> {
        self.shells.get(&id)
    }

    /// 所有開啟中的 shell。 / Open shells in creation order.
    pub fn shell_ids(&self) -> Vec<ShellId> {
        self.shells.keys().copied().collect()
    }

    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    /// Sets the search path of every shell, present and future.
    pub fn set_search_path(&mut self, paths: Vec<String>) {
        for state in self.shells.values_mut() {
            state.sys_path = paths.clone();
        }
        self.search_path = paths;
    }

    /// 套用新的搜尋路徑。 / Pushes the active paths of `change` to every shell.
    pub fn on_pythonpath_changed(&mut self, change: &PathChange) {
        let active = change.active_paths();
        debug!(shells = self.shells.len(), paths = ?active, "refreshing shell search path");
        self.set_search_path(active);
    }

    pub fn set_namespace_view_settings(
        &mut self,
        id: ShellId,
        settings: NamespaceViewSettings,
    ) -> Result<(), ConsoleError> {
        let state = self.state_mut(id)?;
        state.namespace_view = Some(settings);
        Ok(())
    }

    /// 要求 shell 重新整理命名空間。 / Asks shell `id` to refresh its namespace view.
    pub fn refresh_namespace_browser(&mut self, id: ShellId) -> Result<(), ConsoleError> {
        let state = self.state_mut(id)?;
        state.namespace_refreshes += 1;
        Ok(())
    }

    fn state_mut(&mut self, id: ShellId) -> Result<&mut ShellState, ConsoleError> {
        self.shells
            .get_mut(&id)
            .ok_or(ConsoleError::UnknownShell(id))
    }

    fn spawn(&mut self, external_kernel: bool) -> ShellId {
        self.next_shell += 1;
        let id = ShellId(self.next_shell);
        self.shells.insert(
            id,
            ShellState {
                sys_path: self.search_path.clone(),
                external_kernel,
                ..ShellState::default()
            },
        );
        self.publish(ShellEvent::Created(id));
        self.current = Some(id);
        self.publish(ShellEvent::Changed(id));
        id
    }

    fn publish(&mut self, event: ShellEvent) {
        self.subscribers.retain(|sender| sender.send(event).is_ok());
    }
}

impl Plugin for ConsoleHub {
    fn id(&self) -> PluginId {
        PluginId::IPythonConsole
    }

    fn name(&self) -> &'static str {
        "IPython console"
    }

    fn description(&self) -> &'static str {
        "Run code in interactive shells connected to local or external kernels."
    }

    fn requires(&self) -> &'static [PluginId] {
        &[PluginId::Preferences]
    }
}

/// 為每個主控台 shell 維護一個檢視的外掛所實作的介面。 / Implemented by plugins that keep one view per console shell.
pub trait ShellConnect {
    fn set_shell(&mut self, shell: ShellId);

    fn add_shell(&mut self, shell: ShellId);

    fn remove_shell(&mut self, shell: ShellId);

    /// Called once a shell is connected to an external kernel.
    fn on_external_kernel_connected(
        &mut self,
        _shell: ShellId,
        _console: &mut ConsoleHub,
    ) -> Result<(), ConsoleError> {
        Ok(())
    }

    /// Slot holding the event subscription.
    fn console_events(&mut self) -> &mut Option<Receiver<ShellEvent>>;

    /// Subscribes to `console` and adopts the shells it already has.
    fn register_console(&mut self, console: &mut ConsoleHub) {
        *self.console_events() = Some(console.subscribe());
        for shell in console.shell_ids() {
            self.add_shell(shell);
        }
        if let Some(current) = console.current_shell() {
            self.set_shell(current);
        }
    }

    fn unregister_console(&mut self) {
        *self.console_events() = None;
    }

    /// 處理所有待處理事件。 / Drains pending events and returns how many were handled.
    ///
    /// Every drained event is applied even when a handler fails; the first
    /// failure is returned once the batch is done.
    fn process_console_events(&mut self, console: &mut ConsoleHub) -> Result<usize, ConsoleError> {
        let events: Vec<ShellEvent> = match self.console_events() {
            Some(receiver) => receiver.try_iter().collect(),
            None => return Ok(0),
        };
        let mut first_error = None;
        for event in &events {
            match *event {
                ShellEvent::Created(shell) => self.add_shell(shell),
                ShellEvent::Changed(shell) => self.set_shell(shell),
                ShellEvent::Deleted(shell) => self.remove_shell(shell),
                ShellEvent::ExternalKernelConnected(shell) => {
                    if let Err(err) = self.on_external_kernel_connected(shell, console) {
                        warn!(%shell, error = %err, "external kernel setup failed");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(events.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathdock_settings::MemoryConfigStore;

    #[test]
    fn events_follow_shell_lifecycle() {
        let mut console = ConsoleHub::new();
        let events = console.subscribe();

        let first = console.create_shell();
        let second = console.create_shell();
        console.set_current_shell(first).unwrap();
        console.close_shell(first).unwrap();

        let received: Vec<ShellEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                ShellEvent::Created(first),
                ShellEvent::Changed(first),
                ShellEvent::Created(second),
                ShellEvent::Changed(second),
                ShellEvent::Changed(first),
                ShellEvent::Deleted(first),
                ShellEvent::Changed(second),
            ]
        );
        assert_eq!(console.current_shell(), Some(second));
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut console = ConsoleHub::new();
        drop(console.subscribe());
        let _kept = console.subscribe();
        console.create_shell();
        assert_eq!(console.subscriber_count(), 1);
    }

    #[test]
    fn search_path_reaches_existing_and_new_shells() {
        let mut console = ConsoleHub::new();
        let early = console.create_shell();
        console.set_search_path(vec!["/a".into()]);
        let late = console.create_shell();

        assert_eq!(console.shell(early).unwrap().sys_path, vec!["/a".to_string()]);
        assert_eq!(console.shell(late).unwrap().sys_path, vec!["/a".to_string()]);
    }

    #[test]
    fn unknown_shells_are_rejected() {
        let mut console = ConsoleHub::new();
        let id = console.create_shell();
        console.close_shell(id).unwrap();
        assert_eq!(console.close_shell(id), Err(ConsoleError::UnknownShell(id)));
        assert_eq!(console.current_shell(), None);
    }

    #[derive(Default)]
    struct Views {
        shells: Vec<ShellId>,
        current: Option<ShellId>,
        events: Option<Receiver<ShellEvent>>,
    }

    impl ShellConnect for Views {
        fn set_shell(&mut self, shell: ShellId) {
            self.current = Some(shell);
        }

        fn add_shell(&mut self, shell: ShellId) {
            self.shells.push(shell);
        }

        fn remove_shell(&mut self, shell: ShellId) {
            self.shells.retain(|existing| *existing != shell);
            if self.current == Some(shell) {
                self.current = None;
            }
        }

        fn on_external_kernel_connected(
            &mut self,
            shell: ShellId,
            console: &mut ConsoleHub,
        ) -> Result<(), ConsoleError> {
            console.refresh_namespace_browser(shell)
        }

        fn console_events(&mut self) -> &mut Option<Receiver<ShellEvent>> {
            &mut self.events
        }
    }

    #[test]
    fn failing_handler_does_not_drop_later_events() {
        let mut console = ConsoleHub::new();
        let mut views = Views::default();
        views.register_console(&mut console);

        let external = console.connect_external_kernel();
        console.close_shell(external).unwrap();

        assert_eq!(
            views.process_console_events(&mut console),
            Err(ConsoleError::UnknownShell(external))
        );
        assert!(views.shells.is_empty());
        assert_eq!(views.current, None);
        assert_eq!(views.process_console_events(&mut console), Ok(0));
    }

    #[test]
    fn namespace_settings_read_config_overrides() {
        let mut config = MemoryConfigStore::new();
        config
            .set("variable_explorer", "exclude_private", false.into())
            .unwrap();
        config.set("variable_explorer", "minmax", true.into()).unwrap();

        let settings = NamespaceViewSettings::from_config(&config, "variable_explorer");
        assert!(!settings.exclude_private);
        assert!(settings.show_minmax);
        assert!(settings.exclude_callables_and_modules);
    }
}
