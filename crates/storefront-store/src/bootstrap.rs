//! Startup: backend selection, demo catalog, bootstrap admin.

use crate::accounts::AccountService;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::repository::{AccountRepository, CatalogRepository, Store};
use crate::sqlite::SqliteStore;
use std::sync::Arc;
use storefront_core::{AuthConfig, DatabaseConfig, ProductInput, StorageBackend};

/// Open the configured backend and seed it when asked to.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError> {
    let store: Arc<dyn Store> = match config.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(config).await?),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed {
        seed_catalog(store.as_ref()).await?;
    }

    Ok(store)
}

/// The demo catalog.
pub fn seed_products() -> Vec<ProductInput> {
    [
        (
            "Premium Wireless Headphones",
            "High-quality sound with noise cancellation.",
            299.99,
            "Electronics",
            "headphones",
            50,
        ),
        (
            "Minimalist Leather Watch",
            "Elegant design for every occasion.",
            149.50,
            "Accessories",
            "watch",
            30,
        ),
        (
            "Mechanical Keyboard",
            "Tactile feedback for professional typing.",
            120.00,
            "Electronics",
            "keyboard",
            25,
        ),
        (
            "Canvas Backpack",
            "Durable and stylish for daily use.",
            75.00,
            "Bags",
            "backpack",
            40,
        ),
        (
            "Smart Fitness Tracker",
            "Monitor your health and activity.",
            89.99,
            "Electronics",
            "fitness",
            100,
        ),
    ]
    .into_iter()
    .map(|(name, description, price, category, image_seed, stock)| ProductInput {
        name: name.to_string(),
        description: description.to_string(),
        price,
        category: category.to_string(),
        image_url: format!("https://picsum.photos/seed/{image_seed}/400/400"),
        stock,
    })
    .collect()
}

/// Insert the demo catalog if the product table is empty.
///
/// Returns the number of products inserted.
pub async fn seed_catalog<R>(repo: &R) -> Result<usize, StoreError>
where
    R: CatalogRepository + ?Sized,
{
    if repo.count_products().await? > 0 {
        return Ok(0);
    }

    let products = seed_products();
    for product in &products {
        repo.create_product(product).await?;
    }

    tracing::info!(count = products.len(), "Seeded demo catalog");
    Ok(products.len())
}

/// On startup, create the configured admin account if it does not exist.
///
/// Does nothing unless both an email and a password are configured
/// (see [`AuthConfig::bootstrap_admin`]).
pub async fn bootstrap_admin<R>(
    accounts: &AccountService<R>,
    config: &AuthConfig,
) -> Result<(), StoreError>
where
    R: AccountRepository + ?Sized,
{
    let Some((email, password)) = config.bootstrap_admin() else {
        return Ok(());
    };

    if accounts.ensure_admin(&email, &password).await? {
        tracing::warn!(email = %email, "Bootstrapped admin account (password taken from env/config)");
    }
    Ok(())
}
