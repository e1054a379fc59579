//! Shared application state.

use std::sync::Arc;
use storefront_core::StorefrontConfig;
use storefront_store::{AccountService, CredentialHasher, OrderEngine, Store};

/// Shared application state for the API.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    accounts: AccountService<dyn Store>,
    orders: OrderEngine<dyn Store>,
}

impl AppState {
    /// Create state over an opened store.
    pub fn new(store: Arc<dyn Store>, config: &StorefrontConfig) -> Self {
        Self::with_hasher(store, config, CredentialHasher::new())
    }

    /// Create state with a specific password hasher.
    pub fn with_hasher(
        store: Arc<dyn Store>,
        config: &StorefrontConfig,
        hasher: CredentialHasher,
    ) -> Self {
        let accounts = AccountService::new(Arc::clone(&store), &config.auth).with_hasher(hasher);
        let orders = OrderEngine::new(Arc::clone(&store), config.orders.clone());

        Self {
            inner: Arc::new(AppStateInner {
                store,
                accounts,
                orders,
            }),
        }
    }

    /// Catalog, account and order storage.
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub fn accounts(&self) -> &AccountService<dyn Store> {
        &self.inner.accounts
    }

    pub fn orders(&self) -> &OrderEngine<dyn Store> {
        &self.inner.orders
    }
}
