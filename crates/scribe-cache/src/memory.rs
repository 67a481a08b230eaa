//! In-process cache backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::{CacheError, SessionCache};

struct CacheEntry {
    value: Value,
    ttl: Duration,
    expires_at: Instant,
}

/// Single-process [`SessionCache`] backed by a concurrent map.
///
/// Each entry remembers the TTL it was stored with; a `get` hit pushes the
/// expiration out by that TTL (sliding expiration). Expired entries are
/// dropped lazily on access.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet collected) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let _ = self.entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                ttl,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.expires_at > now {
                entry.expires_at = now + entry.ttl;
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired (or missing): collect lazily.
        let _ = self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _ = self.entries.remove(key);
        Ok(())
    }
}
