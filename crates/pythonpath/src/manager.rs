//! Headless model of the PYTHONPATH manager dialog.
//! PYTHONPATH 管理對話框的無介面模型。
//!
//! The list has three sections: project paths (read-only, always active),
//! user paths (editable and reorderable) and system paths (fixed order,
//! activation can be toggled). Accepting the model yields the ordered map
//! to hand to [`PathPrecedenceResolver::apply_update`].
//!
//! [`PathPrecedenceResolver::apply_update`]: crate::PathPrecedenceResolver::apply_update

use pathdock_settings::ConfigStore;
use thiserror::Error;
use tracing::warn;

use crate::export::export_pythonpath;
use crate::filter::is_site_packages;
use crate::map::{PathEntry, PrecedenceMap};
use crate::probe::FsProbe;
use crate::resolver::{keys, PathPrecedenceResolver, CONF_SECTION};

/// 對話框中的區段。 / Section of the dialog a path is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Project,
    User,
    System,
}

/// 使用者路徑的移動方向。 / Where to move a user path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Top,
    Up,
    Down,
    Bottom,
}

/// 新增路徑的結果。 / Result of [`PathManagerModel::add_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The path was already listed; it has been re-activated.
    AlreadyPresent,
    /// Interpreter package directories cannot be added.
    Rejected,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathManagerError {
    #[error("path '{0}' is not listed")]
    NotListed(String),
    #[error("path '{0}' belongs to the {1:?} section and cannot be changed")]
    ReadOnly(String, Section),
}

/// 建立模型所需的資料。 / Inputs used to populate the model.
#[derive(Debug, Clone, Copy)]
pub struct PathManagerInputs<'a> {
    pub project_paths: &'a [String],
    /// Resolver paths: user paths followed by system paths.
    pub paths: &'a [String],
    pub not_active: &'a [String],
    pub system_path: &'a [String],
    pub previous_system_path: &'a [String],
}

/// PYTHONPATH 管理對話框的狀態。 / Editable state of the path-manager dialog.
#[derive(Debug, Clone)]
pub struct PathManagerModel {
    project_paths: Vec<String>,
    user: Vec<PathEntry>,
    system: Vec<PathEntry>,
    original: PrecedenceMap,
}

impl PathManagerModel {
    pub fn new(inputs: PathManagerInputs<'_>) -> Self {
        let is_active = |path: &String| !inputs.not_active.contains(path);
        let user = inputs
            .paths
            .iter()
            .filter(|path| {
                !inputs.system_path.contains(path) && !inputs.previous_system_path.contains(path)
            })
            .map(|path| PathEntry::new(path.as_str(), is_active(path)))
            .collect();
        let system = inputs
            .system_path
            .iter()
            .filter(|path| !is_site_packages(path))
            .map(|path| PathEntry::new(path.as_str(), is_active(path)))
            .collect();

        let mut model = Self {
            project_paths: inputs.project_paths.to_vec(),
            user,
            system,
            original: PrecedenceMap::new(),
        };
        model.original = model.path_dict(false);
        model
    }

    /// Populates the model from a resolver and the current system path.
    pub fn for_resolver<C, P>(resolver: &PathPrecedenceResolver<C, P>, system_path: &[String]) -> Self
    where
        C: ConfigStore,
        P: FsProbe,
    {
        let previous = resolver.config().get_list(CONF_SECTION, keys::SYSTEM_PATH);
        Self::new(PathManagerInputs {
            project_paths: resolver.project_paths(),
            paths: resolver.user_paths(),
            not_active: resolver.not_active_paths(),
            system_path,
            previous_system_path: &previous,
        })
    }

    pub fn project_paths(&self) -> &[String] {
        &self.project_paths
    }

    pub fn user_entries(&self) -> &[PathEntry] {
        &self.user
    }

    pub fn system_entries(&self) -> &[PathEntry] {
        &self.system
    }

    /// Section a path is listed in; project paths win over the other sections.
    pub fn section_of(&self, path: &str) -> Option<Section> {
        if self.project_paths.iter().any(|project| project == path) {
            Some(Section::Project)
        } else if self.user.iter().any(|entry| entry.path == path) {
            Some(Section::User)
        } else if self.system.iter().any(|entry| entry.path == path) {
            Some(Section::System)
        } else {
            None
        }
    }

    /// Adds `dir` at the top of the user paths.
    ///
    /// A path that is already listed is re-activated instead, and moved to
    /// the top of the user paths when `move_to_top` is set.
    pub fn add_path(&mut self, dir: &str, move_to_top: bool) -> AddOutcome {
        if let Some(position) = self.user.iter().position(|entry| entry.path == dir) {
            let mut entry = self.user.remove(position);
            entry.active = true;
            let target = if move_to_top { 0 } else { position };
            self.user.insert(target, entry);
            return AddOutcome::AlreadyPresent;
        }
        if let Some(position) = self.system.iter().position(|entry| entry.path == dir) {
            if move_to_top {
                self.system.remove(position);
                self.user.insert(0, PathEntry::new(dir, true));
            } else {
                self.system[position].active = true;
            }
            return AddOutcome::AlreadyPresent;
        }
        if is_site_packages(dir) {
            warn!(path = dir, "refusing to add interpreter package directory");
            return AddOutcome::Rejected;
        }
        self.user.insert(0, PathEntry::new(dir, true));
        AddOutcome::Added
    }

    /// 移除使用者路徑。 / Removes a user path.
    pub fn remove_path(&mut self, dir: &str) -> Result<(), PathManagerError> {
        let position = self.user_position(dir)?;
        self.user.remove(position);
        Ok(())
    }

    /// Moves a user path inside the user section; moves past either end are clamped.
    pub fn move_path(&mut self, dir: &str, direction: Move) -> Result<(), PathManagerError> {
        let position = self.user_position(dir)?;
        let last = self.user.len() - 1;
        let target = match direction {
            Move::Top => 0,
            Move::Up => position.saturating_sub(1),
            Move::Down => (position + 1).min(last),
            Move::Bottom => last,
        };
        let entry = self.user.remove(position);
        self.user.insert(target, entry);
        Ok(())
    }

    /// 切換路徑的啟用狀態。 / Switches a user or system path on or off.
    pub fn set_active(&mut self, dir: &str, active: bool) -> Result<(), PathManagerError> {
        match self.section_of(dir) {
            Some(Section::Project) => Err(PathManagerError::ReadOnly(dir.to_string(), Section::Project)),
            Some(_) => {
                for entry in self.user.iter_mut().chain(self.system.iter_mut()) {
                    if entry.path == dir {
                        entry.active = active;
                    }
                }
                Ok(())
            }
            None => Err(PathManagerError::NotListed(dir.to_string())),
        }
    }

    /// Ordered map of the listed paths.
    ///
    /// Project paths are left out unless `include_read_only` is set, in
    /// which case they come first.
    pub fn path_dict(&self, include_read_only: bool) -> PrecedenceMap {
        let mut map = PrecedenceMap::new();
        if include_read_only {
            for path in &self.project_paths {
                map.insert(path.as_str(), true);
            }
        }
        for entry in self.user.iter().chain(self.system.iter()) {
            if !include_read_only && self.project_paths.contains(&entry.path) {
                continue;
            }
            map.insert(entry.path.as_str(), entry.active);
        }
        map
    }

    /// 是否有未套用的變更。 / Whether the map differs from the one the model started with.
    pub fn is_modified(&self) -> bool {
        self.path_dict(false) != self.original
    }

    /// Map to apply, or `None` when nothing changed since the model was built.
    pub fn accept(&self) -> Option<PrecedenceMap> {
        self.is_modified().then(|| self.path_dict(false))
    }

    /// `PYTHONPATH` entries to export, including the read-only paths.
    pub fn export(&self, existing: &[String], clear: bool) -> Vec<String> {
        let active = self.path_dict(true).active_paths();
        export_pythonpath(&active, existing, clear)
    }

    fn user_position(&self, dir: &str) -> Result<usize, PathManagerError> {
        if let Some(position) = self.user.iter().position(|entry| entry.path == dir) {
            return Ok(position);
        }
        match self.section_of(dir) {
            Some(section) => Err(PathManagerError::ReadOnly(dir.to_string(), section)),
            None => Err(PathManagerError::NotListed(dir.to_string())),
        }
    }
}
