//! Route definitions for the API.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/login", post(handlers::login))
        // Catalog
        .route(
            "/api/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/api/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/api/categories", get(handlers::categories))
        // Orders
        .route(
            "/api/orders",
            get(handlers::list_orders).post(handlers::place_order),
        )
        .route("/api/orders/{id}", get(handlers::get_order))
        .route("/healthz", get(handlers::healthz))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
