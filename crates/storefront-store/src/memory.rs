//! In-memory backend.
//!
//! Holds every table behind one lock. Order placement validates the whole
//! draft against the current stock before mutating anything, so a failed
//! order leaves the state untouched just like a rolled-back transaction.

use crate::error::{OrderError, StoreError};
use crate::repository::{
    AccountRepository, CatalogRepository, OrderDraft, OrderRepository, StoredAccount,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use storefront_core::{
    Account, Order, OrderDetail, OrderItem, OrderStatus, Product, ProductInput, Role,
};

#[derive(Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    accounts: Vec<StoredAccount>,
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    last_product_id: i64,
    last_account_id: i64,
    last_order_id: i64,
    last_item_id: i64,
}

/// Process-local repositories.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|e| StoreError::Database(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|e| StoreError::Database(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn get_product(&self, id: i64) -> Result<Product, StoreError> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }

    async fn create_product(&self, input: &ProductInput) -> Result<i64, StoreError> {
        let mut tables = self.write()?;
        tables.last_product_id += 1;
        let id = tables.last_product_id;
        tables.products.insert(id, input.clone().into_product(id));
        Ok(id)
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<(), StoreError> {
        if let Some(product) = self.write()?.products.get_mut(&id) {
            *product = input.clone().into_product(id);
        }
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<(), StoreError> {
        self.write()?.products.remove(&id);
        Ok(())
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.products.len() as u64)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Account, StoreError> {
        let mut tables = self.write()?;
        if tables.accounts.iter().any(|a| a.account.email == email) {
            return Err(StoreError::AlreadyExists(format!("account {email}")));
        }

        tables.last_account_id += 1;
        let account = Account {
            id: tables.last_account_id,
            email: email.to_string(),
            role,
        };
        tables.accounts.push(StoredAccount {
            account: account.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(account)
    }

    async fn find_account(&self, email: &str) -> Result<Option<StoredAccount>, StoreError> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .find(|a| a.account.email == email)
            .cloned())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, draft: &OrderDraft) -> Result<i64, OrderError> {
        let mut tables = self.write()?;

        // Dry run over the stock levels this order touches.
        let mut remaining: HashMap<i64, i64> = HashMap::new();
        for line in &draft.lines {
            let stock = match remaining.get(&line.product_id) {
                Some(stock) => *stock,
                None => tables
                    .products
                    .get(&line.product_id)
                    .map(|p| p.stock)
                    .ok_or(OrderError::UnknownProduct(line.product_id))?,
            };
            if draft.enforce_stock && stock < line.quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: stock,
                });
            }
            let left = stock
                .checked_sub(line.quantity)
                .ok_or(OrderError::StockOutOfRange {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: stock,
                })?;
            remaining.insert(line.product_id, left);
        }

        tables.last_order_id += 1;
        let order_id = tables.last_order_id;
        tables.orders.push(Order {
            id: order_id,
            customer_name: draft.customer_name.clone(),
            customer_email: draft.customer_email.clone(),
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            lat: draft.location.lat,
            lng: draft.location.lng,
            created_at: Utc::now(),
        });

        for line in &draft.lines {
            tables.last_item_id += 1;
            let item_id = tables.last_item_id;
            tables.items.push(OrderItem {
                id: item_id,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            });
        }

        for (product_id, stock) in remaining {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock = stock;
            }
        }

        Ok(order_id)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders = self.read()?.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn get_order(&self, id: i64) -> Result<OrderDetail, StoreError> {
        let tables = self.read()?;
        let order = tables
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        let items = tables
            .items
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect();
        Ok(OrderDetail { order, items })
    }
}
