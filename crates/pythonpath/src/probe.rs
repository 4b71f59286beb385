use std::env;
use std::ffi::OsString;
use std::path::Path;

/// 直譯器搜尋路徑的環境變數。 / Environment variable holding the interpreter search path.
pub const PYTHONPATH_VAR: &str = "PYTHONPATH";

/// 載入路徑時需要的檔案系統查詢。 / Filesystem queries needed while loading paths.
pub trait FsProbe {
    fn is_directory(&self, path: &str) -> bool;
}

/// 實際檔案系統的查詢。 / Probe backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFsProbe;

impl FsProbe for OsFsProbe {
    fn is_directory(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }
}

impl<F> FsProbe for F
where
    F: Fn(&str) -> bool,
{
    fn is_directory(&self, path: &str) -> bool {
        self(path)
    }
}

/// 程式啟動時的系統搜尋路徑來源。 / Source of the system search path observed at process start.
pub trait SystemPathSource {
    fn system_path(&self) -> Vec<String>;
}

/// 從環境變數讀取搜尋路徑。 / Reads the search path from an environment variable (`PYTHONPATH` by default).
#[derive(Debug, Clone)]
pub struct EnvSystemPath {
    var: OsString,
}

impl EnvSystemPath {
    pub fn new(var: impl Into<OsString>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSystemPath {
    fn default() -> Self {
        Self::new(PYTHONPATH_VAR)
    }
}

impl SystemPathSource for EnvSystemPath {
    fn system_path(&self) -> Vec<String> {
        match env::var_os(&self.var) {
            Some(value) => split_search_path(&value),
            None => Vec::new(),
        }
    }
}

/// 固定的系統路徑。 / Fixed system path, for hosts that compute it themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSystemPath(pub Vec<String>);

impl SystemPathSource for StaticSystemPath {
    fn system_path(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// 拆解搜尋路徑字串。 / Splits an OS search-path value, dropping empty entries.
pub fn split_search_path(value: &OsString) -> Vec<String> {
    env::split_paths(value)
        .filter(|path| !path.as_os_str().is_empty())
        .map(|path| path.to_string_lossy().into_owned())
        .collect()
}
