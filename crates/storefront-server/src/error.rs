//! Error types for the server crate.

use crate::api_types::ErrorBody;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use storefront_store::{OrderError, StoreError};
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request or rejected input.
    #[error("{0}")]
    BadRequest(String),

    /// Credentials did not match.
    #[error("Invalid credentials")]
    Unauthorized,

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// Internal error. The message is safe to show; the cause is only logged.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::NotFound(format!("Not found: {what}")),
            StoreError::AlreadyExists(what) => ApiError::BadRequest(format!("Already exists: {what}")),
            StoreError::InvalidCredentials => ApiError::Unauthorized,
            StoreError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!(error = %other, "Store operation failed");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            // Root cause is logged by the order engine.
            OrderError::Storage(_) => ApiError::Internal("Failed to place order".to_string()),
            OrderError::InsufficientStock { .. } => ApiError::Conflict(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or serve.
    #[error("failed to start server: {0}")]
    StartupFailed(String),

    /// Storage could not be opened or bootstrapped.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
