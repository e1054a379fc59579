//! Error types for the store crate.

use thiserror::Error;

/// Errors from repositories and the account service.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// No account matches the email and password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The caller supplied unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// Errors from order placement.
///
/// Everything except [`OrderError::Storage`] is caused by the submitted cart
/// and leaves no trace in storage.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line is malformed.
    #[error("invalid cart line {index}: {reason}")]
    InvalidLine { index: usize, reason: String },

    /// Customer name or email is blank.
    #[error("invalid customer: {0}")]
    InvalidCustomer(String),

    /// The claimed total is not a finite amount.
    #[error("invalid total amount: {0}")]
    InvalidTotal(f64),

    /// A cart line references a product that does not exist.
    #[error("unknown product {0}")]
    UnknownProduct(i64),

    /// A cart line asks for more units than are in stock.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    /// Subtracting the line would take stock out of the integer range.
    #[error("stock for product {product_id} cannot be reduced by {requested} from {available}")]
    StockOutOfRange {
        product_id: i64,
        requested: i64,
        available: i64,
    },

    /// The unit of work failed in storage and was rolled back.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}
