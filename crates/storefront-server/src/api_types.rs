//! API request and response types.
//!
//! Product, order and filter payloads reuse the domain types from
//! `storefront-core` directly; only the shapes that exist purely for the
//! HTTP surface live here.

use serde::{Deserialize, Serialize};
use storefront_core::Role;

// =============================================================================
// Auth Types
// =============================================================================

/// Body of `POST /api/auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// Defaults to `user` when absent.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Generic Responses
// =============================================================================

/// Id of a newly created row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Acknowledgement for updates and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error body shared by every failing route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}
