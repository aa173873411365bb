//! Redis-backed lock provider.
//!
//! Acquire is `SET key token NX PX ttl`; release is a compare-and-delete
//! script so a holder whose TTL lapsed can never delete a successor's lock.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::{debug, info};

use crate::{Acquire, LockError, LockProvider, LockToken, ttl_millis};

/// Deletes KEYS[1] only while it still holds ARGV[1].
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Lock provider shared by every agent replica pointed at the same Redis.
#[derive(Clone)]
pub struct RedisLockProvider {
    conn: ConnectionManager,
    release_script: Script,
}

impl RedisLockProvider {
    /// Connect to `host:port` (database 0), authenticating with `password`.
    ///
    /// The password is percent-encoded into the URL, so any characters are
    /// allowed. Fails if the server can't be reached or rejects `PING`.
    pub async fn connect(
        host: &str,
        port: u16,
        password: Option<&str>,
    ) -> Result<Self, LockError> {
        let url = redis_url(host, port, password)?;
        Self::connect_url(&url).await
    }

    /// Connect using a full `redis://` URL.
    pub async fn connect_url(url: &str) -> Result<Self, LockError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        let provider = Self {
            conn,
            release_script: Script::new(RELEASE_SCRIPT),
        };
        provider.ping().await?;
        info!("connected to lock store");
        Ok(provider)
    }

    /// Round-trip a `PING` to the server.
    pub async fn ping(&self) -> Result<(), LockError> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply != "PONG" {
            return Err(LockError::UnexpectedResponse(format!(
                "PING answered {:?}",
                reply
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LockProvider for RedisLockProvider {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<Acquire, LockError> {
        let millis = ttl_millis(ttl)?;
        let token = LockToken::generate();
        let mut conn = self.conn.clone();

        let reply: Option<String> = redis::cmd("SET")
            .arg(name)
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;

        match reply.as_deref() {
            Some("OK") => {
                debug!(lock = name, ttl_ms = millis, "lock acquired");
                Ok(Acquire::Acquired(token))
            }
            None => Ok(Acquire::Busy),
            Some(other) => Err(LockError::UnexpectedResponse(format!(
                "SET NX answered {:?}",
                other
            ))),
        }
    }

    async fn release(&self, name: &str, token: &LockToken) -> Result<bool, LockError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .release_script
            .key(name)
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await?;
        debug!(lock = name, released = deleted > 0, "lock release");
        Ok(deleted > 0)
    }
}

/// Build a `redis://` URL for database 0.
fn redis_url(host: &str, port: u16, password: Option<&str>) -> Result<String, LockError> {
    let mut url = url::Url::parse(&format!("redis://{}:{}/0", host, port))
        .map_err(|e| LockError::InvalidAddress(format!("{}:{}: {}", host, port, e)))?;
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|_| LockError::InvalidAddress(format!("{}:{}", host, port)))?;
    }
    Ok(url.to_string())
}
