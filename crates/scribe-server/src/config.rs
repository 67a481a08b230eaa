//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the scribe server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Heartbeat timeout in seconds (close after no pong for this long).
    pub heartbeat_timeout_secs: u64,
    /// Segment work queue capacity (back-pressure limit).
    pub queue_capacity: usize,
    /// Segment worker pool size.
    pub queue_workers: usize,
    /// Sliding TTL for ephemeral session cache entries, in seconds.
    pub cache_ttl_secs: u64,
    /// Redis URL for the shared cache; in-memory cache when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 50,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            queue_capacity: 256,
            queue_workers: 4,
            cache_ttl_secs: 1800,
            redis_url: None,
        }
    }
}

impl ServerConfig {
    /// Defaults with `SCRIBE_*` environment overrides applied.
    ///
    /// Invalid values are silently ignored (fall back to the default),
    /// matching the rest of the env-override surface.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("SCRIBE_HOST") {
            if !host.is_empty() {
                config.host = host;
            }
        }
        if let Some(port) = read_env_parsed::<u16>("SCRIBE_PORT") {
            config.port = port;
        }
        if let Some(v) = read_env_parsed::<usize>("SCRIBE_MAX_CONNECTIONS") {
            config.max_connections = v;
        }
        if let Some(v) = read_env_parsed::<usize>("SCRIBE_QUEUE_CAPACITY") {
            config.queue_capacity = v;
        }
        if let Some(v) = read_env_parsed::<usize>("SCRIBE_QUEUE_WORKERS") {
            config.queue_workers = v;
        }
        if let Some(v) = read_env_parsed::<u64>("SCRIBE_CACHE_TTL_SECS") {
            config.cache_ttl_secs = v;
        }
        if let Ok(url) = std::env::var("SCRIBE_REDIS_URL") {
            if !url.is_empty() {
                config.redis_url = Some(url);
            }
        }
        config
    }
}

fn read_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
