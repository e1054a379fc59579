//! SQLite backend.

use crate::error::{OrderError, StoreError};
use crate::repository::{
    AccountRepository, CatalogRepository, OrderDraft, OrderRepository, StoredAccount,
};
use crate::schema;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use storefront_core::{
    Account, DatabaseConfig, Order, OrderDetail, OrderItem, OrderStatus, Product, ProductInput,
    Role,
};
use tracing::{info, warn};

/// Repositories backed by one SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema.
    ///
    /// Creates the parent directory if it does not exist, enables WAL journal
    /// mode and foreign keys, and applies the configured busy timeout.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        schema::ensure_schema(&pool).await?;
        info!(path = %config.path.display(), "Database opened");

        Ok(Self { pool })
    }

    /// Open a private in-memory database (for testing).
    ///
    /// Every connection to `:memory:` is its own database, so the pool holds
    /// exactly one connection and never recycles it.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        schema::ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: f64,
    category: Option<String>,
    image_url: Option<String>,
    stock: Option<i64>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description.unwrap_or_default(),
            price: row.price,
            category: row.category.unwrap_or_default(),
            image_url: row.image_url.unwrap_or_default(),
            stock: row.stock.unwrap_or_default(),
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for StoredAccount {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(StoreError::Database)?;
        Ok(StoredAccount {
            account: Account {
                id: row.id,
                email: row.email,
                role,
            },
            password_hash: row.password_hash,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    customer_name: String,
    customer_email: String,
    total_amount: f64,
    status: String,
    lat: Option<f64>,
    lng: Option<f64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status).map_err(StoreError::Database)?;
        Ok(Order {
            id: row.id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            total_amount: row.total_amount,
            status,
            lat: row.lat.unwrap_or_default(),
            lng: row.lng.unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i64,
    price: f64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl CatalogRepository for SqliteStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: i64) -> Result<Product, StoreError> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::from)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }

    async fn create_product(&self, input: &ProductInput) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO products (name, description, price, category, image_url, stock) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.stock)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE products SET name = ?, description = ?, price = ?, category = ?, image_url = ?, stock = ? WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(&input.category)
        .bind(&input.image_url)
        .bind(input.stock)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_products(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

// =============================================================================
// Accounts
// =============================================================================

#[async_trait]
impl AccountRepository for SqliteStore {
    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Account, StoreError> {
        let result = sqlx::query("INSERT INTO users (email, password_hash, role) VALUES (?, ?, ?)")
            .bind(email)
            .bind(password_hash)
            .bind(role.as_str())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Account {
                id: done.last_insert_rowid(),
                email: email.to_string(),
                role,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::AlreadyExists(format!("account {email}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_account(&self, email: &str) -> Result<Option<StoredAccount>, StoreError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(StoredAccount::try_from)
        .transpose()
    }
}

// =============================================================================
// Orders
// =============================================================================

impl SqliteStore {
    /// Every write of an order placement, inside the caller's transaction.
    async fn write_order(
        tx: &mut Transaction<'_, Sqlite>,
        draft: &OrderDraft,
    ) -> Result<i64, OrderError> {
        let order_id = sqlx::query(
            "INSERT INTO orders (customer_name, customer_email, total_amount, status, lat, lng, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.customer_name)
        .bind(&draft.customer_email)
        .bind(draft.total_amount)
        .bind(OrderStatus::Pending.as_str())
        .bind(draft.location.lat)
        .bind(draft.location.lng)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();

        for line in &draft.lines {
            // The guard is evaluated inside the write, so a concurrent
            // checkout cannot consume the same units in between.
            let decremented = if draft.enforce_stock {
                sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ? AND stock >= ?")
                    .bind(line.quantity)
                    .bind(line.product_id)
                    .bind(line.quantity)
                    .execute(&mut **tx)
                    .await?
            } else {
                // SQLite turns an overflowing integer subtraction into REAL.
                sqlx::query(
                    "UPDATE products SET stock = stock - ? WHERE id = ? AND typeof(stock - ?) = 'integer'",
                )
                .bind(line.quantity)
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut **tx)
                .await?
            };

            if decremented.rows_affected() == 0 {
                let available: Option<Option<i64>> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
                        .bind(line.product_id)
                        .fetch_optional(&mut **tx)
                        .await?;

                return Err(match available {
                    None => OrderError::UnknownProduct(line.product_id),
                    Some(stock) if draft.enforce_stock => OrderError::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available: stock.unwrap_or_default(),
                    },
                    Some(stock) => OrderError::StockOutOfRange {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available: stock.unwrap_or_default(),
                    },
                });
            }

            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut **tx)
            .await?;
        }

        Ok(order_id)
    }
}

#[async_trait]
impl OrderRepository for SqliteStore {
    async fn insert_order(&self, draft: &OrderDraft) -> Result<i64, OrderError> {
        let mut tx = self.pool.begin().await?;

        match Self::write_order(&mut tx, draft).await {
            Ok(order_id) => {
                tx.commit().await?;
                Ok(order_id)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Order rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }

    async fn get_order(&self, id: i64) -> Result<OrderDetail, StoreError> {
        let order = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderDetail {
            order: Order::try_from(order)?,
            items: items.into_iter().map(OrderItem::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::{CartLine, GeoPoint};

    async fn test_db() -> SqliteStore {
        SqliteStore::open_in_memory().await.unwrap()
    }

    fn input(name: &str, price: f64, stock: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            description: format!("{name} description"),
            price,
            category: "Electronics".to_string(),
            image_url: String::new(),
            stock,
        }
    }

    fn draft(lines: Vec<CartLine>, enforce_stock: bool) -> OrderDraft {
        OrderDraft {
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            total_amount: 0.0,
            location: GeoPoint { lat: 37.7749, lng: -122.4194 },
            lines,
            enforce_stock,
        }
    }

    fn line(product_id: i64, quantity: i64, price: f64) -> CartLine {
        CartLine { product_id, quantity, price }
    }

    async fn order_count(db: &SqliteStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(1) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn item_count(db: &SqliteStore) -> i64 {
        sqlx::query_scalar("SELECT COUNT(1) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    // === Catalog tests ===

    #[tokio::test]
    async fn create_get_update_delete_product() {
        let db = test_db().await;
        let id = db.create_product(&input("Keyboard", 120.0, 25)).await.unwrap();

        let product = db.get_product(id).await.unwrap();
        assert_eq!(product.name, "Keyboard");
        assert_eq!(product.stock, 25);

        db.update_product(id, &input("Keyboard v2", 130.0, 10)).await.unwrap();
        let product = db.get_product(id).await.unwrap();
        assert_eq!(product.name, "Keyboard v2");
        assert_eq!(product.price, 130.0);

        db.delete_product(id).await.unwrap();
        assert!(matches!(db.get_product(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_ids_are_silent_for_update_and_delete() {
        let db = test_db().await;
        db.create_product(&input("Watch", 149.5, 30)).await.unwrap();
        let before = db.list_products().await.unwrap();

        db.update_product(999, &input("Ghost", 1.0, 1)).await.unwrap();
        db.delete_product(999).await.unwrap();

        assert_eq!(db.list_products().await.unwrap(), before);
    }

    #[tokio::test]
    async fn negative_price_and_empty_name_are_accepted() {
        let db = test_db().await;
        let id = db.create_product(&input("", -5.0, -1)).await.unwrap();
        let product = db.get_product(id).await.unwrap();
        assert_eq!(product.name, "");
        assert_eq!(product.price, -5.0);
    }

    // === Account tests ===

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_constraint() {
        let db = test_db().await;
        let account = db.insert_account("a@example.com", "hash", Role::Admin).await.unwrap();
        assert_eq!(account.role, Role::Admin);

        let err = db.insert_account("a@example.com", "other", Role::User).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = ?")
            .bind("a@example.com")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn find_account_is_exact_match() {
        let db = test_db().await;
        db.insert_account("a@example.com", "hash", Role::User).await.unwrap();

        let found = db.find_account("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash");
        assert!(db.find_account("A@example.com").await.unwrap().is_none());
    }

    // === Order tests ===

    #[tokio::test]
    async fn order_writes_items_and_decrements_stock() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, 25)).await.unwrap();
        let watch = db.create_product(&input("Watch", 149.5, 30)).await.unwrap();

        let mut order = draft(vec![line(keyboard, 3, 120.0)], true);
        order.total_amount = 360.0;
        let order_id = db.insert_order(&order).await.unwrap();

        assert_eq!(db.get_product(keyboard).await.unwrap().stock, 22);
        assert_eq!(db.get_product(watch).await.unwrap().stock, 30);

        let detail = db.get_order(order_id).await.unwrap();
        assert_eq!(detail.order.total_amount, 360.0);
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].product_id, keyboard);
        assert_eq!(detail.items[0].quantity, 3);
        assert_eq!(detail.items[0].price, 120.0);
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_everything() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, 25)).await.unwrap();

        let err = db
            .insert_order(&draft(vec![line(keyboard, 2, 120.0), line(404, 1, 1.0)], true))
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::UnknownProduct(404)));
        assert_eq!(db.get_product(keyboard).await.unwrap().stock, 25);
        assert_eq!(order_count(&db).await, 0);
        assert_eq!(item_count(&db).await, 0);
    }

    #[tokio::test]
    async fn stock_guard_rejects_oversell_atomically() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, 5)).await.unwrap();

        // Two lines on the same product: 3 + 3 exceeds 5.
        let err = db
            .insert_order(&draft(vec![line(keyboard, 3, 120.0), line(keyboard, 3, 120.0)], true))
            .await
            .unwrap_err();

        match err {
            OrderError::InsufficientStock { product_id, requested, available } => {
                assert_eq!(product_id, keyboard);
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(db.get_product(keyboard).await.unwrap().stock, 5);
        assert_eq!(order_count(&db).await, 0);
    }

    #[tokio::test]
    async fn permissive_mode_lets_stock_go_negative() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, 1)).await.unwrap();

        db.insert_order(&draft(vec![line(keyboard, 4, 120.0)], false)).await.unwrap();
        assert_eq!(db.get_product(keyboard).await.unwrap().stock, -3);
    }

    #[tokio::test]
    async fn permissive_mode_refuses_stock_overflow() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, -5)).await.unwrap();

        let err = db
            .insert_order(&draft(vec![line(keyboard, i64::MAX, 1.0)], false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::StockOutOfRange { requested: i64::MAX, available: -5, .. }
        ));
        assert_eq!(order_count(&db).await, 0);
        assert_eq!(item_count(&db).await, 0);
        // The column still decodes as an integer.
        assert_eq!(db.list_products().await.unwrap()[0].stock, -5);
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, 25)).await.unwrap();

        let first = db.insert_order(&draft(vec![line(keyboard, 1, 120.0)], true)).await.unwrap();
        let second = db.insert_order(&draft(vec![line(keyboard, 1, 120.0)], true)).await.unwrap();

        let ids: Vec<i64> = db.list_orders().await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn deleting_ordered_product_keeps_order_items() {
        let db = test_db().await;
        let keyboard = db.create_product(&input("Keyboard", 120.0, 25)).await.unwrap();
        let order_id = db.insert_order(&draft(vec![line(keyboard, 1, 120.0)], true)).await.unwrap();

        db.delete_product(keyboard).await.unwrap();

        let detail = db.get_order(order_id).await.unwrap();
        assert_eq!(detail.items[0].product_id, keyboard);
    }

    #[tokio::test]
    async fn open_creates_file_and_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("shop.db"),
            ..DatabaseConfig::default()
        };

        let db = SqliteStore::open(&config).await.unwrap();
        db.create_product(&input("Keyboard", 120.0, 25)).await.unwrap();
        drop(db);

        // Reopening is idempotent and keeps the data.
        let db = SqliteStore::open(&config).await.unwrap();
        assert_eq!(db.count_products().await.unwrap(), 1);
    }
}
