use crate::domain::ports::UserCache;
use crate::domain::user::UserSnapshot;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::warn;

/// Key scheme shared with every other consumer of the cache.
const KEY_PREFIX: &str = "user:";

/// A Redis-backed user cache.
///
/// Values are the canonical JSON snapshot with a per-key TTL. The connection
/// manager multiplexes one connection and reconnects on failure; `Clone`
/// shares it.
#[derive(Clone)]
pub struct RedisUserCache {
    conn: ConnectionManager,
}

impl RedisUserCache {
    /// Connects to the Redis instance at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    fn key(id: &str) -> String {
        format!("{KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, id: &str) -> Result<Option<UserSnapshot>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::key(id)).await?;
        let Some(json) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                // A corrupt entry must not wedge lookups; treat it as a miss
                // and let the next population overwrite it.
                warn!(user_id = id, error = %err, "dropping undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn put(&self, id: &str, snapshot: &UserSnapshot, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(snapshot)
            .map_err(|err| ServiceError::Backend(Box::new(err)))?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(Self::key(id), json, ttl.as_secs()).await?;
        Ok(())
    }

    async fn invalidate(&self, id: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(id)).await?;
        Ok(())
    }
}
