//! # storefront-core
//!
//! Types shared across the storefront crates:
//! - the domain model (accounts, products, orders, cart lines)
//! - the service configuration loaded from `storefront.toml`

// Configuration types shared across all storefront crates
pub mod config;

// Domain model
pub mod model;

// Re-export commonly used types for convenience
pub use config::{
    AuthConfig, ConfigError, DatabaseConfig, OrdersConfig, ServerConfig, StorageBackend,
    StorefrontConfig,
};
pub use model::{
    Account, CartLine, GeoPoint, NewOrder, Order, OrderDetail, OrderItem, OrderStatus, Product,
    ProductFilter, ProductInput, Role, distinct_categories, round_cents,
};
