use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ConfigError, ConfigStore, ConfigValue};

const CONFIG_VERSION: u32 = 1;

type Sections = BTreeMap<String, BTreeMap<String, ConfigValue>>;

/// 僅存在記憶體中的設定儲存。 / Configuration store that lives only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryConfigStore {
    sections: Sections,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 目前所有選項的數量。 / Total number of stored options.
    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, section: &str, key: &str) -> Option<ConfigValue> {
        self.sections.get(section)?.get(key).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: ConfigValue) -> Result<(), ConfigError> {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    sections: Sections,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            sections: Sections::new(),
        }
    }
}

/// 以 JSON 檔案保存的設定儲存。 / Configuration store persisted as a JSON file.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written configuration behind.
#[derive(Debug)]
pub struct JsonConfigStore {
    path: PathBuf,
    data: ConfigFile,
}

impl JsonConfigStore {
    /// 載入設定檔；若不存在則從空白開始。 / Loads the file, starting empty when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!(path = %path.display(), "configuration file missing, starting empty");
            return Ok(Self {
                path,
                data: ConfigFile::default(),
            });
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut data: ConfigFile =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        if data.version == 0 {
            data.version = CONFIG_VERSION;
        }
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 列出所有區段名稱。 / Names of the sections currently stored.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.data.sections.keys().map(String::as_str)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            ConfigError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| ConfigError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigStore for JsonConfigStore {
    fn get(&self, section: &str, key: &str) -> Option<ConfigValue> {
        self.data.sections.get(section)?.get(key).cloned()
    }

    fn set(&mut self, section: &str, key: &str, value: ConfigValue) -> Result<(), ConfigError> {
        let options = self.data.sections.entry(section.to_string()).or_default();
        if options.get(key) == Some(&value) && self.path.exists() {
            return Ok(());
        }
        let previous = options.insert(key.to_string(), value);
        if let Err(err) = self.save() {
            // 寫入失敗時還原記憶體內容。 / Keep memory in step with the file on failure.
            let options = self.data.sections.entry(section.to_string()).or_default();
            match previous {
                Some(previous) => {
                    options.insert(key.to_string(), previous);
                }
                None => {
                    options.remove(key);
                    if options.is_empty() {
                        self.data.sections.remove(section);
                    }
                }
            }
            return Err(err);
        }
        Ok(())
    }
}
