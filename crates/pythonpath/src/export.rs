use std::env;
use std::ffi::OsString;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("path '{path}' cannot be exported: {source}")]
pub struct ExportError {
    pub path: String,
    #[source]
    pub source: env::JoinPathsError,
}

/// Merges the active search path into an existing `PYTHONPATH` value.
///
/// With `clear` the existing entries are discarded. Otherwise they are
/// kept, minus the ones already active, and the active paths follow them.
pub fn export_pythonpath(active: &[String], existing: &[String], clear: bool) -> Vec<String> {
    if clear {
        return active.to_vec();
    }
    existing
        .iter()
        .filter(|path| !active.contains(path))
        .chain(active.iter())
        .cloned()
        .collect()
}

/// 以平台分隔字元串接路徑。 / Joins paths with the platform separator, ready to be placed in the environment.
pub fn join_pythonpath(paths: &[String]) -> Result<OsString, ExportError> {
    env::join_paths(paths).map_err(|source| ExportError {
        path: paths
            .iter()
            .find(|path| env::join_paths([path.as_str()]).is_err())
            .cloned()
            .unwrap_or_default(),
        source,
    })
}
