use std::fmt;
use std::path::Path;

use pathdock_settings::{ConfigError, ConfigStore, ConfigValue};
use thiserror::Error;
use tracing::debug;

use crate::load::{load, LoadInputs};
use crate::map::{compute_map, PrecedenceMap};
use crate::migration::migrate_legacy_files;
use crate::probe::{FsProbe, OsFsProbe, SystemPathSource};

/// PYTHONPATH 管理器的設定區段。 / Configuration section owned by the PYTHONPATH manager.
pub const CONF_SECTION: &str = "pythonpath_manager";

/// 設定區段中的選項名稱。 / Option names stored under [`CONF_SECTION`].
pub mod keys {
    /// Ordered user paths (may include system paths after an update).
    pub const PATH: &str = "path";
    /// Paths the user switched off.
    pub const NOT_ACTIVE_PATH: &str = "not_active_path";
    /// System path seen on the last run, used to detect removals.
    pub const SYSTEM_PATH: &str = "system_path";
    /// Derived active path, written for other consumers.
    pub const SPYDER_PYTHONPATH: &str = "spyder_pythonpath";
    /// Set while paths still live in the legacy flat files.
    pub const PATHS_IN_CONF_FILES: &str = "paths_in_conf_files";
}

/// 解析器的錯誤。 / Errors raised by the resolver.
#[derive(Debug, Error)]
pub enum PythonpathError {
    #[error("failed to persist option `{key}`: {source}")]
    Persist {
        key: &'static str,
        #[source]
        source: ConfigError,
    },
    #[error("failed to migrate legacy path files: {0}")]
    Migration(#[source] ConfigError),
}

/// 有效搜尋路徑變更時送出的通知。 / Notification sent when the effective precedence map changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub old: PrecedenceMap,
    pub new: PrecedenceMap,
}

impl PathChange {
    /// Paths present in the new map but not in the old one.
    pub fn added(&self) -> Vec<String> {
        self.new
            .iter()
            .filter(|(path, _)| !self.old.contains(path))
            .map(|(path, _)| path.to_string())
            .collect()
    }

    /// Paths present in the old map but not in the new one.
    pub fn removed(&self) -> Vec<String> {
        self.old
            .iter()
            .filter(|(path, _)| !self.new.contains(path))
            .map(|(path, _)| path.to_string())
            .collect()
    }

    /// 新對應表中啟用的路徑。 / Active paths of the new map.
    pub fn active_paths(&self) -> Vec<String> {
        self.new.active_paths()
    }
}

/// 訂閱代號。 / Handle returned by [`PathPrecedenceResolver::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&PathChange)>;

/// 管理專案、使用者與停用路徑狀態。 / Owns the project, user and inactive path state.
///
/// The configuration store is kept in sync with that state. Every mutation runs a change check: the precedence map is computed
/// before and after, and subscribers hear about it only when the two
/// differ. A no-op mutation therefore emits nothing.
pub struct PathPrecedenceResolver<C, P = OsFsProbe> {
    config: C,
    probe: P,
    project_paths: Vec<String>,
    user_paths: Vec<String>,
    not_active: Vec<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<C: ConfigStore> PathPrecedenceResolver<C> {
    pub fn new(config: C) -> Self {
        Self::with_probe(config, OsFsProbe)
    }
}

impl<C: ConfigStore, P: FsProbe> PathPrecedenceResolver<C, P> {
    pub fn with_probe(config: C, probe: P) -> Self {
        Self {
            config,
            probe,
            project_paths: Vec::new(),
            user_paths: Vec::new(),
            not_active: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Loads the persisted state at startup.
    ///
    /// Migrates the legacy flat files first when `legacy_dir` is given and
    /// the store still flags them, then filters the persisted paths against
    /// the filesystem and the current system path. The filtered state is
    /// written back so removed paths do not resurface in later sessions.
    pub fn setup(
        &mut self,
        system: &dyn SystemPathSource,
        legacy_dir: Option<&Path>,
    ) -> Result<(), PythonpathError> {
        if let Some(dir) = legacy_dir {
            migrate_legacy_files(&mut self.config, dir).map_err(PythonpathError::Migration)?;
        }

        let inputs = LoadInputs {
            persisted_paths: self.config.get_list(CONF_SECTION, keys::PATH),
            persisted_not_active: self.config.get_list(CONF_SECTION, keys::NOT_ACTIVE_PATH),
            system_path_now: system.system_path(),
            system_path_previous: self.config.get_list(CONF_SECTION, keys::SYSTEM_PATH),
        };
        let loaded = load(&self.probe, &inputs);

        self.persist(keys::PATH, loaded.retained.clone().into())?;
        self.persist(keys::SYSTEM_PATH, inputs.system_path_now.clone().into())?;
        self.persist(keys::NOT_ACTIVE_PATH, loaded.not_active.clone().into())?;

        self.user_paths = loaded.user_paths;
        self.not_active = loaded.not_active;

        let active = self.active_paths();
        debug!(paths = ?active, "loaded search path");
        self.persist(keys::SPYDER_PYTHONPATH, active.into())
    }

    /// Records the current system path so the next start can detect removals.
    pub fn on_close(&mut self, system: &dyn SystemPathSource) -> Result<(), PythonpathError> {
        self.persist(keys::SYSTEM_PATH, system.system_path().into())
    }

    /// 目前的專案路徑。 / Paths of the open project.
    pub fn project_paths(&self) -> &[String] {
        &self.project_paths
    }

    /// User paths followed by the system paths appended at load time.
    pub fn user_paths(&self) -> &[String] {
        &self.user_paths
    }

    pub fn not_active_paths(&self) -> &[String] {
        &self.not_active
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Current precedence map: project paths, then user paths.
    pub fn precedence_map(&self) -> PrecedenceMap {
        compute_map(&self.project_paths, &self.user_paths, &self.not_active)
    }

    /// Active paths in precedence order.
    pub fn active_paths(&self) -> Vec<String> {
        self.precedence_map().active_paths()
    }

    /// Replaces the project paths wholesale; closing a project passes an empty list.
    pub fn set_project_paths(
        &mut self,
        project_paths: Vec<String>,
    ) -> Result<Option<PathChange>, PythonpathError> {
        self.mutate(|resolver| {
            resolver.project_paths = project_paths;
            Ok(())
        })
    }

    /// Project open (`Some`) or close (`None`).
    pub fn update_active_project_path(
        &mut self,
        path: Option<&str>,
    ) -> Result<Option<PathChange>, PythonpathError> {
        match path {
            Some(path) => {
                debug!(path = %path, "adding project path to search path");
                self.set_project_paths(vec![path.to_string()])
            }
            None => {
                debug!("removing project path because the project was closed");
                self.set_project_paths(Vec::new())
            }
        }
    }

    /// Applies a new ordered `path -> active` mapping for the user paths.
    ///
    /// `user_map` must not contain the project paths. Each option is
    /// written only when it actually differs from the current state.
    pub fn apply_update(
        &mut self,
        user_map: &PrecedenceMap,
    ) -> Result<Option<PathChange>, PythonpathError> {
        let user_paths = user_map.paths();
        let not_active = user_map.inactive_paths();
        self.mutate(|resolver| {
            let paths_changed = user_paths != resolver.user_paths;
            let not_active_changed = not_active != resolver.not_active;
            if paths_changed {
                resolver.persist(keys::PATH, user_paths.as_slice().into())?;
            }
            if not_active_changed {
                resolver.persist(keys::NOT_ACTIVE_PATH, not_active.as_slice().into())?;
            }
            // 兩個選項都寫入後才更新狀態。 / State moves only once both options are stored.
            if paths_changed {
                resolver.user_paths = user_paths;
            }
            if not_active_changed {
                resolver.not_active = not_active;
            }
            Ok(())
        })
    }

    /// Registers a listener for effective changes.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&PathChange) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener; returns `false` when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    fn mutate<F>(&mut self, op: F) -> Result<Option<PathChange>, PythonpathError>
    where
        F: FnOnce(&mut Self) -> Result<(), PythonpathError>,
    {
        let old = self.precedence_map();
        op(self)?;
        let new = self.precedence_map();
        if old == new {
            return Ok(None);
        }

        let active = new.active_paths();
        debug!(paths = ?active, "search path updated");
        let cached = self.persist(keys::SPYDER_PYTHONPATH, active.into());

        // Listeners are notified even when the cache write fails.
        let change = PathChange { old, new };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
        cached.map(|()| Some(change))
    }

    fn persist(&mut self, key: &'static str, value: ConfigValue) -> Result<(), PythonpathError> {
        self.config
            .set(CONF_SECTION, key, value)
            .map_err(|source| PythonpathError::Persist { key, source })
    }
}

impl<C, P> fmt::Debug for PathPrecedenceResolver<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPrecedenceResolver")
            .field("project_paths", &self.project_paths)
            .field("user_paths", &self.user_paths)
            .field("not_active", &self.not_active)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
