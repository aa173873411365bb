//! Process-local lock provider.
//!
//! Same contract as the Redis provider, scoped to one process. Expiry is
//! measured on the tokio clock so paused-time tests can drive it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::debug;

use crate::{Acquire, LockError, LockProvider, LockToken, ttl_millis};

#[derive(Debug, Clone)]
struct Holder {
    token: LockToken,
    expires_at: Instant,
}

impl Holder {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory lock table.
///
/// Cloning shares the table, so clones behave like replicas pointed at the
/// same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockProvider {
    holders: Arc<DashMap<String, Holder>>,
}

impl MemoryLockProvider {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` currently has a live holder.
    pub fn is_held(&self, name: &str) -> bool {
        let now = Instant::now();
        self.holders
            .get(name)
            .map(|h| h.is_live(now))
            .unwrap_or(false)
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<Acquire, LockError> {
        ttl_millis(ttl)?;
        let now = Instant::now();
        let token = LockToken::generate();
        let holder = Holder {
            token: token.clone(),
            expires_at: now + ttl,
        };

        // The entry guard holds the shard lock, which makes check-and-set atomic.
        match self.holders.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_live(now) {
                    return Ok(Acquire::Busy);
                }
                debug!(lock = name, "taking over expired lock");
                entry.insert(holder);
            }
            Entry::Vacant(entry) => {
                entry.insert(holder);
            }
        }

        Ok(Acquire::Acquired(token))
    }

    async fn release(&self, name: &str, token: &LockToken) -> Result<bool, LockError> {
        // An expired entry is dropped too, but reported as not held, the same
        // answer Redis gives once the key has timed out.
        let now = Instant::now();
        Ok(self
            .holders
            .remove_if(name, |_, holder| holder.token == *token)
            .map(|(_, holder)| holder.is_live(now))
            .unwrap_or(false))
    }
}
