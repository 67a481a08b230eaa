//! # scribe-cache
//!
//! Shared ephemeral session state for scale-out and reconnection recovery.
//!
//! The [`SessionCache`] trait is the collaborator contract the engine
//! consumes: `set` with a TTL, `get` with sliding-expiration semantics (a
//! hit refreshes the entry), `delete` for eviction. Two backends:
//!
//! - [`MemoryCache`] — single-process, for tests and local runs
//! - [`RedisCache`] — the cross-process backend that lets multiple server
//!   instances observe the same session state
//!
//! The cache is only eventually consistent with in-process registry
//! mutations; readers must tolerate brief staleness.

#![deny(unsafe_code)]

mod memory;
mod redis_backend;
pub mod snapshot;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

/// Errors surfaced by a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend rejected or failed the operation.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A stored value could not be (de)serialized.
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

/// Ephemeral key-value store with sliding expiration.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store `value` under `key`, expiring `ttl` after the last touch.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch the value under `key`, refreshing its expiration on a hit.
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Remove the entry under `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
