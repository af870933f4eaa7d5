use thiserror::Error;

/// Errors that can occur when interacting with the cart or order stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An optimistic version check failed; the record changed underneath
    /// the caller. Safe to retry with a fresh read.
    #[error("version conflict for {key}: expected {expected}, found {actual}")]
    VersionConflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// The record to update does not exist.
    #[error("record not found: {key}")]
    NotFound { key: String },

    /// An order with this reference or id already exists.
    #[error("duplicate order reference: {0}")]
    DuplicateReference(String),

    /// The backing store could not be reached or timed out. Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
