//! # storefront-store
//!
//! Storage for the storefront: one narrow repository trait per entity, two
//! backends, and the services built on top of them.
//!
//! - [`repository`]: `CatalogRepository`, `AccountRepository`, `OrderRepository`
//! - [`sqlite`]: the durable backend (one SQLite file, sqlx pool)
//! - [`memory`]: a process-local backend, used as the test fake
//! - [`accounts`]: signup and credential checks
//! - [`orders`]: the order engine (validation, totals, atomic placement)
//! - [`bootstrap`]: backend selection, demo catalog seed, admin bootstrap

pub mod accounts;
pub mod bootstrap;
pub mod error;
pub mod memory;
pub mod orders;
pub mod password;
pub mod repository;
pub mod schema;
pub mod sqlite;

pub use accounts::AccountService;
pub use bootstrap::{bootstrap_admin, open_store, seed_catalog};
pub use error::{OrderError, StoreError};
pub use memory::MemoryStore;
pub use orders::OrderEngine;
pub use password::CredentialHasher;
pub use repository::{
    AccountRepository, CatalogRepository, OrderDraft, OrderRepository, Store, StoredAccount,
};
pub use sqlite::SqliteStore;
