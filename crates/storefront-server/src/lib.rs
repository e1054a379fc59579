//! # storefront-server
//!
//! JSON REST surface for the storefront.
//!
//! Each route parses its path or body into an explicit request type, calls
//! exactly one store or engine operation, and returns JSON. Failures become
//! an HTTP status with a one-line `{"error": "..."}` body.
//!
//! ## Routes
//!
//! - `POST /api/auth/signup`, `POST /api/auth/login`
//! - `GET|POST /api/products`, `GET|PUT|DELETE /api/products/{id}`
//! - `GET /api/categories`
//! - `GET|POST /api/orders`, `GET /api/orders/{id}`
//! - `GET /healthz`

pub mod api_types;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ServerError};
pub use routes::create_router;
pub use server::StorefrontServer;
pub use state::AppState;
