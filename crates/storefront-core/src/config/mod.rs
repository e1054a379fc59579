//! Configuration types for the storefront service.
//!
//! Configuration is loaded from a single TOML file (`storefront.toml` by
//! default). Every section and field has a default, so an empty or missing
//! file yields a working development setup.
//!
//! # Sections
//!
//! - **server**: HTTP bind address
//! - **database**: storage backend, SQLite file path, pool size, seeding
//! - **orders**: checkout policy (total recomputation, stock guard, fallback coordinates)
//! - **auth**: signup policy and the optional bootstrap admin

pub mod auth;
pub mod database;
pub mod orders;
pub mod server;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use auth::AuthConfig;
pub use database::{DatabaseConfig, StorageBackend};
pub use orders::OrdersConfig;
pub use server::ServerConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "STOREFRONT_CONFIG";

/// Config file looked up in the working directory when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "storefront.toml";

/// Complete storefront configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Checkout policy.
    #[serde(default)]
    pub orders: OrdersConfig,

    /// Account policy.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StorefrontConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Resolve and load the configuration.
    ///
    /// Lookup order: the explicit path, then `STOREFRONT_CONFIG`, then
    /// `storefront.toml` in the working directory. An explicit path (or the
    /// env var) must exist; the implicit default file may be absent, in which
    /// case built-in defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(path);
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.exists() {
            return Self::from_file(default);
        }
        Ok(Self::default())
    }
}
