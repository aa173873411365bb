//! Error types for the storage layer.

use thiserror::Error;

/// Errors that can occur when reading or writing garden data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store is not reachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
