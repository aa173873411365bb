//! Error types for lock providers.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to a lock store.
#[derive(Debug, Error)]
pub enum LockError {
    /// Redis command or connection failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The lock store URL could not be built.
    #[error("invalid lock store address: {0}")]
    InvalidAddress(String),

    /// TTL too small to be represented by the store.
    #[error("invalid lock TTL {0:?}: must be at least one millisecond")]
    InvalidTtl(Duration),

    /// The store answered with something the protocol does not allow.
    #[error("unexpected lock store response: {0}")]
    UnexpectedResponse(String),
}
