//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:3000"
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}
