//! Redis cache backend for multi-instance deployments.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;
use tracing::debug;

use crate::{CacheError, SessionCache};

/// [`SessionCache`] backed by Redis.
///
/// Values are stored as JSON strings with `SET .. EX`. Redis does not keep
/// a per-key sliding window, so the cache is constructed with the sliding
/// TTL and a `get` hit re-arms the key with `EXPIRE`.
pub struct RedisCache {
    conn: ConnectionManager,
    sliding_ttl: Duration,
}

impl RedisCache {
    /// Connect to Redis at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str, sliding_ttl: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Backend(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        debug!(url, "connected to redis cache");
        Ok(Self { conn, sliding_ttl })
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let json =
            serde_json::to_string(&value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, json, ttl.as_secs())
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let Some(json) = raw else {
            return Ok(None);
        };

        // Re-arm the sliding window on a hit.
        let seconds = i64::try_from(self.sliding_ttl.as_secs()).unwrap_or(i64::MAX);
        let _: bool = conn
            .expire(key, seconds)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn redis_url() -> Option<String> {
        std::env::var("REDIS_URL").ok()
    }

    // Requires a running Redis; run with `REDIS_URL=redis://localhost:6379
    // cargo test -p scribe-cache -- --ignored`.
    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn roundtrip_against_live_redis() {
        let Some(url) = redis_url() else {
            return;
        };
        let cache = RedisCache::connect(&url, Duration::from_secs(60))
            .await
            .unwrap();

        cache
            .set("scribe:test:k1", json!({"a": 1}), Duration::from_secs(30))
            .await
            .unwrap();
        let value = cache.get("scribe:test:k1").await.unwrap();
        assert_eq!(value, Some(json!({"a": 1})));

        cache.delete("scribe:test:k1").await.unwrap();
        assert!(cache.get("scribe:test:k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn connect_to_bad_url_fails() {
        let result = RedisCache::connect("not-a-url", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
