use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize configuration {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write configuration {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 設定選項的值。 / Value stored under a configuration option.
///
/// Serialized untagged so that the on-disk JSON stays plain
/// (`true`, `"text"`, `["a", "b"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(values: Vec<String>) -> Self {
        ConfigValue::List(values)
    }
}

impl From<&[String]> for ConfigValue {
    fn from(values: &[String]) -> Self {
        ConfigValue::List(values.to_vec())
    }
}

/// 以區段與鍵存取的設定儲存介面。 / Sectioned key/value configuration store.
///
/// Every `set` is persisted before returning; keys are independent, so
/// rewriting one never requires touching another.
pub trait ConfigStore {
    /// Returns the raw value of `section.key`, if any.
    fn get(&self, section: &str, key: &str) -> Option<ConfigValue>;

    /// Stores `value` under `section.key` and persists it.
    fn set(&mut self, section: &str, key: &str, value: ConfigValue) -> Result<(), ConfigError>;

    /// Returns `section.key` or `default` when the option is missing.
    fn get_or(&self, section: &str, key: &str, default: ConfigValue) -> ConfigValue {
        self.get(section, key).unwrap_or(default)
    }

    /// Reads a boolean option; values of another type fall back to `default`.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get(section, key)
            .and_then(|value| value.as_bool())
            .unwrap_or(default)
    }

    /// Reads a string list option; missing or mistyped values read as empty.
    fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get(section, key)
            .and_then(|value| value.as_list().map(<[String]>::to_vec))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_serialize_as_plain_json() {
        let list = ConfigValue::from(vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(serde_json::to_string(&list).unwrap(), r#"["/a","/b"]"#);
        assert_eq!(serde_json::to_string(&ConfigValue::Bool(false)).unwrap(), "false");

        let parsed: ConfigValue = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_int(), Some(42));
        let parsed: ConfigValue = serde_json::from_str(r#""text""#).unwrap();
        assert_eq!(parsed.as_text(), Some("text"));
    }

    #[test]
    fn accessors_reject_other_variants() {
        let value = ConfigValue::Text("true".into());
        assert_eq!(value.as_bool(), None);
        assert_eq!(value.as_list(), None);
        assert_eq!(ConfigValue::Bool(true).as_text(), None);
    }
}
