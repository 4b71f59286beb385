//! Configuration storage for pathdock plugins.
//! pathdock 外掛共用的設定儲存。

pub mod config;
pub mod storage;

pub use config::{ConfigError, ConfigStore, ConfigValue};
pub use storage::{JsonConfigStore, MemoryConfigStore};
