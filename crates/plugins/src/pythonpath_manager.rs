use std::path::PathBuf;

use pathdock_pythonpath::{
    FsProbe, OsFsProbe, PathChange, PathManagerModel, PathPrecedenceResolver, PrecedenceMap,
    PythonpathError, SystemPathSource,
};
use pathdock_settings::ConfigStore;

use crate::plugin::{Plugin, PluginId};

/// 擁有搜尋路徑解析器的外掛。 / Plugin owning the search-path resolver.
pub struct PythonpathManager<C, P = OsFsProbe> {
    resolver: PathPrecedenceResolver<C, P>,
    system: Box<dyn SystemPathSource>,
    legacy_dir: Option<PathBuf>,
}

impl<C: ConfigStore> PythonpathManager<C> {
    pub fn new(config: C, system: Box<dyn SystemPathSource>, legacy_dir: Option<PathBuf>) -> Self {
        Self::with_resolver(PathPrecedenceResolver::new(config), system, legacy_dir)
    }
}

impl<C: ConfigStore, P: FsProbe> PythonpathManager<C, P> {
    pub fn with_resolver(
        resolver: PathPrecedenceResolver<C, P>,
        system: Box<dyn SystemPathSource>,
        legacy_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            system,
            legacy_dir,
        }
    }

    /// Migrates, loads and publishes the persisted search path.
    pub fn on_initialize(&mut self) -> Result<(), PythonpathError> {
        self.resolver
            .setup(&*self.system, self.legacy_dir.as_deref())
    }

    /// Saves the current system path to detect changes on the next start.
    pub fn on_close(&mut self) -> Result<(), PythonpathError> {
        self.resolver.on_close(&*self.system)
    }

    /// 唯讀存取解析器。 / Read access to the resolver.
    pub fn resolver(&self) -> &PathPrecedenceResolver<C, P> {
        &self.resolver
    }

    pub fn system_path(&self) -> Vec<String> {
        self.system.system_path()
    }

    /// Active search path including the project path.
    pub fn get_spyder_pythonpath(&self) -> Vec<String> {
        self.resolver.active_paths()
    }

    /// 開啟專案時加入其路徑。 / Puts the project path in front of the search path.
    pub fn open_project(&mut self, path: &str) -> Result<Option<PathChange>, PythonpathError> {
        self.resolver.update_active_project_path(Some(path))
    }

    /// 關閉專案時移除其路徑。 / Drops the project path from the search path.
    pub fn close_project(&mut self) -> Result<Option<PathChange>, PythonpathError> {
        self.resolver.update_active_project_path(None)
    }

    /// 套用管理對話框的結果。 / Applies the map accepted in the path manager.
    pub fn apply_update(
        &mut self,
        user_map: &PrecedenceMap,
    ) -> Result<Option<PathChange>, PythonpathError> {
        self.resolver.apply_update(user_map)
    }

    /// Fresh path-manager model reflecting the current state.
    pub fn path_manager(&self) -> PathManagerModel {
        PathManagerModel::for_resolver(&self.resolver, &self.system.system_path())
    }
}

impl<C, P> Plugin for PythonpathManager<C, P> {
    fn id(&self) -> PluginId {
        PluginId::PythonpathManager
    }

    fn name(&self) -> &'static str {
        "PYTHONPATH manager"
    }

    fn description(&self) -> &'static str {
        "Manager of additional locations to search for Python modules."
    }
}
