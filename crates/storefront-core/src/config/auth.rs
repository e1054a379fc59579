//! Account configuration.

use serde::{Deserialize, Serialize};

/// Environment variable holding the bootstrap admin password.
pub const ADMIN_PASSWORD_ENV: &str = "STOREFRONT_ADMIN_PASSWORD";

/// Configuration for signup and the bootstrap admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether signup may request the `admin` role.
    #[serde(default = "default_allow_admin_signup")]
    pub allow_admin_signup: bool,

    /// Email of an admin account created on startup if missing.
    #[serde(default)]
    pub admin_email: Option<String>,

    /// Password for the bootstrap admin. For security: prefer setting env var
    /// `STOREFRONT_ADMIN_PASSWORD`.
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl AuthConfig {
    /// Bootstrap admin credentials, if fully configured.
    ///
    /// Password source (highest precedence first):
    /// - env `STOREFRONT_ADMIN_PASSWORD`
    /// - `[auth].admin_password`
    pub fn bootstrap_admin(&self) -> Option<(String, String)> {
        let email = self.admin_email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let password = std::env::var(ADMIN_PASSWORD_ENV)
            .ok()
            .or_else(|| self.admin_password.clone())
            .filter(|p| !p.trim().is_empty())?;
        Some((email.to_string(), password))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_admin_signup: default_allow_admin_signup(),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn default_allow_admin_signup() -> bool {
    true
}
