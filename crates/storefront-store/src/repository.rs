//! Repository interfaces.
//!
//! One trait per entity so a backend can be swapped and the order-placement
//! invariant can be tested against [`crate::MemoryStore`].

use crate::error::{OrderError, StoreError};
use async_trait::async_trait;
use storefront_core::{Account, CartLine, GeoPoint, Order, OrderDetail, Product, ProductInput, Role};

/// Product CRUD.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All products, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// One product, or `NotFound`.
    async fn get_product(&self, id: i64) -> Result<Product, StoreError>;

    /// Insert a product and return its new id.
    async fn create_product(&self, input: &ProductInput) -> Result<i64, StoreError>;

    /// Replace every field of a product. Succeeds when the id does not exist.
    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<(), StoreError>;

    /// Remove a product. Succeeds when the id does not exist.
    async fn delete_product(&self, id: i64) -> Result<(), StoreError>;

    /// Number of products, used to decide whether to seed.
    async fn count_products(&self) -> Result<u64, StoreError>;
}

/// An account together with its stored credential hash.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub account: Account,
    pub password_hash: String,
}

/// User records.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert an account. Fails with `AlreadyExists` when the email is taken;
    /// the check is the storage constraint itself, not a prior lookup.
    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Account, StoreError>;

    /// Exact-match lookup by email.
    async fn find_account(&self, email: &str) -> Result<Option<StoredAccount>, StoreError>;
}

/// A validated order, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_email: String,
    pub total_amount: f64,
    pub location: GeoPoint,
    /// Written in this order.
    pub lines: Vec<CartLine>,
    /// Refuse lines that would take a product's stock below zero.
    pub enforce_stock: bool,
}

/// Orders and their line items.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Write the order, its items and the stock decrements as one unit.
    ///
    /// On any error nothing is observable afterwards: no order row, no item
    /// rows, no stock change.
    async fn insert_order(&self, draft: &OrderDraft) -> Result<i64, OrderError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// One order with its items in insertion order, or `NotFound`.
    async fn get_order(&self, id: i64) -> Result<OrderDetail, StoreError>;
}

/// A complete backend.
pub trait Store: CatalogRepository + AccountRepository + OrderRepository {}

impl<T> Store for T where T: CatalogRepository + AccountRepository + OrderRepository {}
