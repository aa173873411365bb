//! Distributed job locks for the GreenThumb agent.
//!
//! A lock is a named key in a shared store holding an owner token and a TTL.
//! At most one holder exists per name; a lock whose TTL has elapsed counts as
//! released, so a crashed holder only blocks others until expiry.
//!
//! This crate provides:
//! - The [`LockProvider`] contract used by the job runner
//! - A Redis implementation for multi-replica deployments
//! - An in-memory implementation for tests and single-process runs

mod error;
mod memory;
mod redis_lock;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub use error::LockError;
pub use memory::MemoryLockProvider;
pub use redis_lock::RedisLockProvider;

/// Build the store key for a job lock.
pub fn job_lock_key(job_name: &str) -> String {
    format!("agent:{}:lock", job_name)
}

/// Opaque owner token identifying one successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a fresh, globally unique token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The token's wire representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a non-blocking acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquire {
    /// The caller now holds the lock and must release it with this token.
    Acquired(LockToken),
    /// Another live holder owns the lock.
    Busy,
}

impl Acquire {
    /// Whether the attempt produced a lock.
    pub fn is_acquired(&self) -> bool {
        matches!(self, Acquire::Acquired(_))
    }
}

/// A shared store offering named, TTL-bounded, non-blocking locks.
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Try to take `name` for `ttl`. Never blocks waiting for the holder.
    ///
    /// Must be atomic against concurrent callers across processes.
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<Acquire, LockError>;

    /// Release `name` if and only if it is still held under `token`.
    ///
    /// Returns `Ok(true)` when this call removed the lock. A lock that already
    /// expired, was released, or now belongs to someone else yields
    /// `Ok(false)` and is left untouched.
    async fn release(&self, name: &str, token: &LockToken) -> Result<bool, LockError>;
}

/// Convert a TTL to whole milliseconds, rejecting values the store can't hold.
pub(crate) fn ttl_millis(ttl: Duration) -> Result<u64, LockError> {
    let millis = u64::try_from(ttl.as_millis()).map_err(|_| LockError::InvalidTtl(ttl))?;
    if millis == 0 {
        return Err(LockError::InvalidTtl(ttl));
    }
    Ok(millis)
}
