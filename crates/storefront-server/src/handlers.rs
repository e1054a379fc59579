//! Request handlers for the API.
//!
//! Extractors are taken as `Result<_, Rejection>` so that malformed bodies,
//! path ids and query strings come back as `400` with the JSON error body
//! instead of axum's plain-text rejection.

use crate::api_types::{
    CreatedResponse, HealthResponse, LoginRequest, SignupRequest, SuccessResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use storefront_core::{
    Account, NewOrder, Order, OrderDetail, Product, ProductFilter, ProductInput,
    distinct_categories,
};
use storefront_store::{CatalogRepository, OrderRepository, StoreError};

// =============================================================================
// Auth
// =============================================================================

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(req) = body?;
    let account = state
        .accounts()
        .register(&req.email, &req.password, req.role)
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists(_) => ApiError::BadRequest("Email already exists".to_string()),
            other => other.into(),
        })?;
    Ok(Json(account))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(req) = body?;
    let account = state.accounts().authenticate(&req.email, &req.password).await?;
    Ok(Json(account))
}

// =============================================================================
// Catalog
// =============================================================================

/// `GET /api/products?category=&q=`
pub async fn list_products(
    State(state): State<AppState>,
    filter: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(filter) = filter?;
    let products = state.store().list_products().await?;
    Ok(Json(filter.apply(products)))
}

/// `GET /api/products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(id) = id?;
    let product = state.store().get_product(id).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::NotFound("Product not found".to_string()),
        other => other.into(),
    })?;
    Ok(Json(product))
}

/// `POST /api/products`
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(input) = body?;
    let id = state.store().create_product(&input).await?;
    tracing::info!(product_id = id, name = %input.name, "Product created");
    Ok(Json(CreatedResponse { id }))
}

/// `PUT /api/products/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(id) = id?;
    let Json(input) = body?;
    state.store().update_product(id, &input).await?;
    tracing::info!(product_id = id, "Product updated");
    Ok(Json(SuccessResponse::ok()))
}

/// `DELETE /api/products/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(id) = id?;
    state.store().delete_product(id).await?;
    tracing::info!(product_id = id, "Product deleted");
    Ok(Json(SuccessResponse::ok()))
}

/// `GET /api/categories`
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let products = state.store().list_products().await?;
    Ok(Json(distinct_categories(&products)))
}

// =============================================================================
// Orders
// =============================================================================

/// `GET /api/orders`
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.store().list_orders().await?))
}

/// `GET /api/orders/{id}`
pub async fn get_order(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderDetail>, ApiError> {
    let Path(id) = id?;
    let detail = state.store().get_order(id).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::NotFound("Order not found".to_string()),
        other => other.into(),
    })?;
    Ok(Json(detail))
}

/// `POST /api/orders`
pub async fn place_order(
    State(state): State<AppState>,
    body: Result<Json<NewOrder>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(order) = body?;
    let id = state.orders().place(order).await?;
    Ok(Json(CreatedResponse { id }))
}

// =============================================================================
// Misc
// =============================================================================

/// `GET /healthz`
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
