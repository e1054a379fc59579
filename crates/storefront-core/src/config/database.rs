//! Storage configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A single SQLite database file.
    #[default]
    Sqlite,
    /// Process-local state, lost on exit.
    Memory,
}

/// Configuration for the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite file. Parent directories are created on startup.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Maximum pooled SQLite connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Busy timeout for locked databases, in seconds.
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Insert the demo catalog when the product table is empty.
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            seed: true,
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("data/ecommerce.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}
