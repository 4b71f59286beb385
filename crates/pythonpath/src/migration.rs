use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use pathdock_settings::{ConfigError, ConfigStore};
use tracing::{info, warn};

use crate::resolver::{keys, CONF_SECTION};

/// 舊版路徑檔名。 / Legacy file holding one search path per line.
pub const LEGACY_PATH_FILE: &str = "path";
/// 舊版停用路徑檔名。 / Legacy file holding one inactive path per line.
pub const LEGACY_NOT_ACTIVE_FILE: &str = "not_active_path";

/// 將舊版純文字檔中的路徑移轉至設定儲存。 / Moves paths kept in the old flat files into the store.
///
/// Runs only while the `paths_in_conf_files` flag is set (it defaults to
/// set) and clears the flag afterwards, so it happens once per store.
/// Missing or unreadable files count as empty. Returns whether the
/// migration ran.
pub fn migrate_legacy_files<C>(config: &mut C, legacy_dir: &Path) -> Result<bool, ConfigError>
where
    C: ConfigStore + ?Sized,
{
    if !config.get_bool(CONF_SECTION, keys::PATHS_IN_CONF_FILES, true) {
        return Ok(false);
    }

    let path = read_lines(&legacy_dir.join(LEGACY_PATH_FILE));
    let not_active_path = read_lines(&legacy_dir.join(LEGACY_NOT_ACTIVE_FILE));
    info!(
        dir = %legacy_dir.display(),
        paths = path.len(),
        inactive = not_active_path.len(),
        "migrating legacy path files"
    );

    config.set(CONF_SECTION, keys::PATH, path.into())?;
    config.set(CONF_SECTION, keys::NOT_ACTIVE_PATH, not_active_path.into())?;
    config.set(CONF_SECTION, keys::PATHS_IN_CONF_FILES, false.into())?;
    Ok(true)
}

fn read_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable legacy path file");
            Vec::new()
        }
    }
}
