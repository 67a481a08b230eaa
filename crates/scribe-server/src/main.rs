//! Scribe server binary — wires the service graph and starts the gateway.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use scribe_agents::config::{AgentConfigStore, default_agent_configs};
use scribe_agents::registry::AgentRegistry;
use scribe_cache::{MemoryCache, RedisCache, SessionCache};
use scribe_core::store::{MemoryStore, Persistence};
use scribe_engine::decision::DecisionEngine;
use scribe_engine::dispatcher::Dispatcher;
use scribe_engine::extract::{EntityIntentExtractor, StaticExtractor};
use scribe_engine::pipeline::SegmentPipeline;
use scribe_engine::queue::SegmentQueue;
use scribe_engine::registry::SessionRegistry;
use scribe_engine::{EventEmitter, SessionService};
use scribe_rpc::context::RpcContext;
use scribe_rpc::handlers::register_methods;
use scribe_rpc::registry::MethodRegistry;
use scribe_server::config::ServerConfig;
use scribe_server::metrics;
use scribe_server::server::ScribeServer;
use tracing_subscriber::EnvFilter;

/// Scribe realtime agent pipeline server.
#[derive(Parser, Debug)]
#[command(name = "scribed", about = "Scribe realtime agent pipeline server")]
struct Cli {
    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Redis URL for the shared session cache (in-memory cache if omitted).
    #[arg(long)]
    redis_url: Option<String>,

    /// Segment work queue capacity.
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Segment worker pool size.
    #[arg(long)]
    queue_workers: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.redis_url.is_some() {
            config.redis_url = self.redis_url;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if let Some(workers) = self.queue_workers {
            config.queue_workers = workers;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::from_env();
    Cli::parse().apply(&mut config);
    let cache_ttl = Duration::from_secs(config.cache_ttl_secs);

    // Collaborators. Persistent storage and the extraction models are
    // deployment concerns behind their ports; the defaults here keep a
    // single instance self-contained.
    let store: Arc<dyn Persistence> = Arc::new(MemoryStore::new());
    let cache: Arc<dyn SessionCache> = match &config.redis_url {
        Some(url) => {
            tracing::info!(url, "using redis session cache");
            Arc::new(
                RedisCache::connect(url, cache_ttl)
                    .await
                    .context("failed to connect to redis")?,
            )
        }
        None => {
            tracing::info!("using in-memory session cache (single instance)");
            Arc::new(MemoryCache::new())
        }
    };
    let extractor: Arc<dyn EntityIntentExtractor> = Arc::new(StaticExtractor::default());
    tracing::info!("using static extractor (no extraction backend configured)");

    // Engine.
    let emitter = Arc::new(EventEmitter::new());
    let agent_registry = Arc::new(AgentRegistry::builtin());
    let agent_configs = Arc::new(AgentConfigStore::with_configs(default_agent_configs()));
    tracing::info!(
        agents = ?agent_registry.names(),
        "agent registry initialized"
    );
    let pipeline = Arc::new(SegmentPipeline::new(
        extractor,
        DecisionEngine::new(agent_registry, agent_configs),
        Dispatcher::new(store.clone()),
        store.clone(),
    ));

    // Server + shutdown wiring.
    let mut methods = MethodRegistry::new();
    register_methods(&mut methods);

    let metrics_handle = metrics::install_recorder();

    // The queue's workers stop on the same token that stops the server.
    let worker_cancel = tokio_util::sync::CancellationToken::new();
    let queue = SegmentQueue::start(
        pipeline,
        emitter.clone(),
        config.queue_capacity,
        config.queue_workers,
        worker_cancel.child_token(),
    );
    let sessions = Arc::new(SessionService::new(
        store.clone(),
        cache,
        Arc::new(SessionRegistry::new()),
        emitter,
        queue,
        cache_ttl,
    ));
    let ctx = Arc::new(RpcContext { sessions, store });

    let server = ScribeServer::new(config, methods, ctx).with_metrics(metrics_handle);

    // Ctrl-C initiates graceful shutdown.
    let server_cancel = server.cancel_token();
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            worker_cancel.cancel();
            server_cancel.cancel();
        }
    });

    server.serve().await.context("server error")
}
