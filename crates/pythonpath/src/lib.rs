//! PYTHONPATH bookkeeping for pathdock: precedence map, startup load,
//! change notification, legacy migration and the path-manager model.
//! pathdock 的 PYTHONPATH 管理：優先順序、啟動載入、變更通知與舊資料移轉。

pub mod export;
pub mod filter;
pub mod load;
pub mod manager;
pub mod map;
pub mod migration;
pub mod probe;
pub mod resolver;

pub use export::{export_pythonpath, join_pythonpath, ExportError};
pub use filter::is_site_packages;
pub use load::{load, LoadInputs, LoadedPaths};
pub use manager::{
    AddOutcome, Move, PathManagerError, PathManagerInputs, PathManagerModel, Section,
};
pub use map::{active_paths, compute_map, PathEntry, PrecedenceMap};
pub use migration::{migrate_legacy_files, LEGACY_NOT_ACTIVE_FILE, LEGACY_PATH_FILE};
pub use probe::{
    split_search_path, EnvSystemPath, FsProbe, OsFsProbe, StaticSystemPath, SystemPathSource,
    PYTHONPATH_VAR,
};
pub use resolver::{
    keys, PathChange, PathPrecedenceResolver, PythonpathError, SubscriptionId, CONF_SECTION,
};
