//! Order engine.
//!
//! Turns a submitted checkout into an [`OrderDraft`] and hands it to the
//! repository, which writes the order, its line items and the stock
//! decrements as a single unit of work.
//!
//! Policy comes from [`OrdersConfig`]:
//! - `recompute_total`: store Σ(price × quantity) rather than the claimed total
//! - `enforce_stock`: refuse lines that would take stock below zero
//! - `fallback_lat` / `fallback_lng`: coordinates for checkouts without any

use crate::error::OrderError;
use crate::repository::{OrderDraft, OrderRepository};
use std::sync::Arc;
use storefront_core::{NewOrder, OrdersConfig};
use tracing::{error, info, warn};

/// Places orders.
pub struct OrderEngine<R: ?Sized> {
    repo: Arc<R>,
    config: OrdersConfig,
}

impl<R: ?Sized> Clone for OrderEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: self.config.clone(),
        }
    }
}

impl<R: OrderRepository + ?Sized> OrderEngine<R> {
    pub fn new(repo: Arc<R>, config: OrdersConfig) -> Self {
        Self { repo, config }
    }

    /// Validate and resolve a checkout without touching storage.
    pub fn prepare(&self, order: NewOrder) -> Result<OrderDraft, OrderError> {
        if order.customer_name.trim().is_empty() {
            return Err(OrderError::InvalidCustomer("customer name must not be blank".to_string()));
        }
        if order.customer_email.trim().is_empty() {
            return Err(OrderError::InvalidCustomer("customer email must not be blank".to_string()));
        }
        if order.items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        for (index, line) in order.items.iter().enumerate() {
            if line.quantity <= 0 {
                return Err(OrderError::InvalidLine {
                    index,
                    reason: format!("quantity must be positive, got {}", line.quantity),
                });
            }
            if !line.price.is_finite() || line.price < 0.0 {
                return Err(OrderError::InvalidLine {
                    index,
                    reason: format!("price must be a non-negative amount, got {}", line.price),
                });
            }
        }
        if !order.total_amount.is_finite() {
            return Err(OrderError::InvalidTotal(order.total_amount));
        }

        let computed = order.cart_total();
        if !computed.is_finite() {
            return Err(OrderError::InvalidTotal(computed));
        }
        let total_amount = if self.config.recompute_total {
            if (computed - order.total_amount).abs() >= 0.005 {
                warn!(
                    claimed = order.total_amount,
                    computed,
                    "Claimed order total differs from cart; storing computed total"
                );
            }
            computed
        } else {
            order.total_amount
        };

        let location = order.location_or(self.config.fallback());

        Ok(OrderDraft {
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            total_amount,
            location,
            lines: order.items,
            enforce_stock: self.config.enforce_stock,
        })
    }

    /// Validate the checkout and record it atomically. Returns the order id.
    pub async fn place(&self, order: NewOrder) -> Result<i64, OrderError> {
        let draft = self.prepare(order)?;

        match self.repo.insert_order(&draft).await {
            Ok(order_id) => {
                info!(
                    order_id,
                    lines = draft.lines.len(),
                    total_amount = draft.total_amount,
                    "Order placed"
                );
                Ok(order_id)
            }
            Err(OrderError::Storage(cause)) => {
                error!(error = %cause, "Order placement failed in storage");
                Err(OrderError::Storage(cause))
            }
            Err(e) => {
                info!(error = %e, "Order rejected");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::CatalogRepository;
    use crate::sqlite::SqliteStore;
    use crate::{OrderRepository, Store};
    use storefront_core::{CartLine, DatabaseConfig, ProductInput};

    fn keyboard() -> ProductInput {
        ProductInput {
            name: "Mechanical Keyboard".to_string(),
            description: "Tactile feedback for professional typing.".to_string(),
            price: 120.0,
            category: "Electronics".to_string(),
            image_url: String::new(),
            stock: 25,
        }
    }

    fn backpack() -> ProductInput {
        ProductInput {
            name: "Canvas Backpack".to_string(),
            description: "Durable and stylish for daily use.".to_string(),
            price: 75.0,
            category: "Bags".to_string(),
            image_url: String::new(),
            stock: 40,
        }
    }

    fn checkout(items: Vec<CartLine>, total_amount: f64) -> NewOrder {
        NewOrder {
            customer_name: "Ada Lovelace".to_string(),
            customer_email: "ada@example.com".to_string(),
            items,
            total_amount,
            lat: None,
            lng: None,
        }
    }

    fn line(product_id: i64, quantity: i64, price: f64) -> CartLine {
        CartLine { product_id, quantity, price }
    }

    async fn backends() -> Vec<Arc<dyn Store>> {
        let memory: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let sqlite: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        vec![memory, sqlite]
    }

    #[tokio::test]
    async fn persisted_cart_matches_submission() {
        for store in backends().await {
            let keyboard_id = store.create_product(&keyboard()).await.unwrap();
            let backpack_id = store.create_product(&backpack()).await.unwrap();
            let untouched = store.create_product(&keyboard()).await.unwrap();
            let engine = OrderEngine::new(store.clone(), OrdersConfig::default());

            let cart = vec![line(backpack_id, 2, 75.0), line(keyboard_id, 3, 120.0)];
            let order_id = engine.place(checkout(cart.clone(), 510.0)).await.unwrap();

            let detail = store.get_order(order_id).await.unwrap();
            let persisted: Vec<CartLine> = detail
                .items
                .iter()
                .map(|i| line(i.product_id, i.quantity, i.price))
                .collect();
            assert_eq!(persisted, cart);
            assert_eq!(detail.order.total_amount, 510.0);
            assert_eq!(detail.order.lat, 37.7749);
            assert_eq!(detail.order.lng, -122.4194);

            assert_eq!(store.get_product(keyboard_id).await.unwrap().stock, 22);
            assert_eq!(store.get_product(backpack_id).await.unwrap().stock, 38);
            assert_eq!(store.get_product(untouched).await.unwrap().stock, 25);
        }
    }

    #[tokio::test]
    async fn unknown_product_is_all_or_nothing() {
        for store in backends().await {
            let keyboard_id = store.create_product(&keyboard()).await.unwrap();
            let engine = OrderEngine::new(store.clone(), OrdersConfig::default());

            let err = engine
                .place(checkout(vec![line(keyboard_id, 1, 120.0), line(9_999, 1, 5.0)], 125.0))
                .await
                .unwrap_err();

            assert!(matches!(err, OrderError::UnknownProduct(9_999)));
            assert!(store.list_orders().await.unwrap().is_empty());
            assert_eq!(store.get_product(keyboard_id).await.unwrap().stock, 25);
        }
    }

    #[tokio::test]
    async fn spoofed_total_is_replaced() {
        for store in backends().await {
            let keyboard_id = store.create_product(&keyboard()).await.unwrap();
            let engine = OrderEngine::new(store.clone(), OrdersConfig::default());

            let order_id = engine
                .place(checkout(vec![line(keyboard_id, 3, 120.0)], 0.01))
                .await
                .unwrap();
            assert_eq!(store.get_order(order_id).await.unwrap().order.total_amount, 360.0);
        }
    }

    #[tokio::test]
    async fn permissive_policy_keeps_claimed_total_and_oversells() {
        for store in backends().await {
            let keyboard_id = store.create_product(&keyboard()).await.unwrap();
            let config = OrdersConfig {
                recompute_total: false,
                enforce_stock: false,
                ..OrdersConfig::default()
            };
            let engine = OrderEngine::new(store.clone(), config);

            let order_id = engine
                .place(checkout(vec![line(keyboard_id, 30, 120.0)], 1.0))
                .await
                .unwrap();
            assert_eq!(store.get_order(order_id).await.unwrap().order.total_amount, 1.0);
            assert_eq!(store.get_product(keyboard_id).await.unwrap().stock, -5);
        }
    }

    #[tokio::test]
    async fn stock_guard_rejects_oversell() {
        for store in backends().await {
            let keyboard_id = store.create_product(&keyboard()).await.unwrap();
            let engine = OrderEngine::new(store.clone(), OrdersConfig::default());

            let err = engine
                .place(checkout(vec![line(keyboard_id, 26, 120.0)], 3120.0))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                OrderError::InsufficientStock { requested: 26, available: 25, .. }
            ));
            assert_eq!(store.get_product(keyboard_id).await.unwrap().stock, 25);
        }
    }

    #[tokio::test]
    async fn concurrent_checkouts_cannot_oversell() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut last_unit = keyboard();
        last_unit.stock = 1;
        let id = store.create_product(&last_unit).await.unwrap();
        let engine = OrderEngine::new(store.clone(), OrdersConfig::default());

        let (a, b) = tokio::join!(
            engine.place(checkout(vec![line(id, 1, 120.0)], 120.0)),
            engine.place(checkout(vec![line(id, 1, 120.0)], 120.0)),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(store.get_product(id).await.unwrap().stock, 0);
        assert_eq!(store.list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_on_disk_sell_exactly_the_stock() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("shop.db"),
            max_connections: 5,
            ..DatabaseConfig::default()
        };
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&config).await.unwrap());
        let mut scarce = keyboard();
        scarce.stock = 3;
        let id = store.create_product(&scarce).await.unwrap();
        let engine = OrderEngine::new(store.clone(), OrdersConfig::default());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine.place(checkout(vec![line(id, 1, 120.0)], 120.0)).await
                })
            })
            .collect();

        let mut placed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => assert!(
                    matches!(e, OrderError::InsufficientStock { .. }),
                    "unexpected error: {e:?}"
                ),
            }
        }

        assert_eq!(placed, 3);
        assert_eq!(store.get_product(id).await.unwrap().stock, 0);
        assert_eq!(store.list_orders().await.unwrap().len(), 3);
    }

    #[test]
    fn prepare_rejects_overflowing_cart_total() {
        let engine = OrderEngine::new(Arc::new(MemoryStore::new()), OrdersConfig::default());

        let err = engine
            .prepare(checkout(vec![line(1, 10, 1e308)], 1.0))
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTotal(total) if total.is_infinite()));

        let permissive = OrderEngine::new(
            Arc::new(MemoryStore::new()),
            OrdersConfig {
                recompute_total: false,
                ..OrdersConfig::default()
            },
        );
        assert!(matches!(
            permissive.prepare(checkout(vec![line(1, 10, 1e308)], 1.0)),
            Err(OrderError::InvalidTotal(_))
        ));
    }

    #[test]
    fn prepare_rejects_malformed_checkouts() {
        let engine = OrderEngine::new(Arc::new(MemoryStore::new()), OrdersConfig::default());

        assert!(matches!(engine.prepare(checkout(vec![], 0.0)), Err(OrderError::EmptyCart)));
        assert!(matches!(
            engine.prepare(checkout(vec![line(1, 0, 1.0)], 0.0)),
            Err(OrderError::InvalidLine { index: 0, .. })
        ));
        assert!(matches!(
            engine.prepare(checkout(vec![line(1, 1, 1.0), line(2, 1, -1.0)], 0.0)),
            Err(OrderError::InvalidLine { index: 1, .. })
        ));
        assert!(matches!(
            engine.prepare(checkout(vec![line(1, 1, 1.0)], f64::NAN)),
            Err(OrderError::InvalidTotal(_))
        ));

        let mut anonymous = checkout(vec![line(1, 1, 1.0)], 1.0);
        anonymous.customer_email = " ".to_string();
        assert!(matches!(engine.prepare(anonymous), Err(OrderError::InvalidCustomer(_))));
    }

    #[test]
    fn prepare_keeps_submitted_coordinates() {
        let engine = OrderEngine::new(Arc::new(MemoryStore::new()), OrdersConfig::default());
        let mut order = checkout(vec![line(1, 1, 1.0)], 1.0);
        order.lat = Some(37.8);
        order.lng = Some(-122.45);

        let draft = engine.prepare(order).unwrap();
        assert_eq!(draft.location.lat, 37.8);
        assert_eq!(draft.location.lng, -122.45);
        assert!(draft.enforce_stock);
    }
}
