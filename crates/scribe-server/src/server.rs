//! `ScribeServer` — Axum HTTP + WebSocket gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use scribe_core::ConnectionId;
use scribe_rpc::context::RpcContext;
use scribe_rpc::registry::MethodRegistry;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::websocket::broadcast::BroadcastManager;
use crate::websocket::event_bridge::EventBridge;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast manager for event fan-out.
    pub broadcast: Arc<BroadcastManager>,
    /// RPC method registry.
    pub registry: Arc<MethodRegistry>,
    /// Handler DI context.
    pub ctx: Arc<RpcContext>,
    /// When the server started.
    pub start_time: Instant,
    /// Rendered by `GET /metrics` when present.
    pub metrics: Option<PrometheusHandle>,
    /// Connection admission limit.
    pub max_connections: usize,
}

/// The scribe realtime gateway.
pub struct ScribeServer {
    config: ServerConfig,
    registry: Arc<MethodRegistry>,
    ctx: Arc<RpcContext>,
    broadcast: Arc<BroadcastManager>,
    cancel: CancellationToken,
    metrics: Option<PrometheusHandle>,
    start_time: Instant,
}

impl ScribeServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, registry: MethodRegistry, ctx: Arc<RpcContext>) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            ctx,
            broadcast: Arc::new(BroadcastManager::new()),
            cancel: CancellationToken::new(),
            metrics: None,
            start_time: Instant::now(),
        }
    }

    /// Attach an installed Prometheus recorder for `GET /metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            broadcast: self.broadcast.clone(),
            registry: self.registry.clone(),
            ctx: self.ctx.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            max_connections: self.config.max_connections,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Get the broadcast manager.
    pub fn broadcast(&self) -> &Arc<BroadcastManager> {
        &self.broadcast
    }

    /// Cancellation token that stops the server when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the method registry.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    /// Bind and serve until the cancellation token fires.
    ///
    /// Spawns the event bridge that routes domain events to session
    /// subscribers for the lifetime of the server.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr()?, "scribe server listening");

        let bridge = EventBridge::new(
            self.ctx.sessions.emitter().subscribe(),
            self.broadcast.clone(),
        );
        let bridge_handle = tokio::spawn(bridge.run());

        let cancel = self.cancel.clone();
        let router = self.router();
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await;

        bridge_handle.abort();
        info!("scribe server stopped");
        result
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.broadcast.connection_count().await;
    let sessions = state.ctx.sessions.registry().session_count();
    Json(health::health_check(state.start_time, connections, sessions))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// GET /ws — WebSocket upgrade. The `user` query parameter identifies the
/// caller; unauthenticated deployments fall back to `"anonymous"`.
async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    if state.broadcast.connection_count().await >= state.max_connections {
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    let user_id = params
        .get("user")
        .cloned()
        .unwrap_or_else(|| "anonymous".to_owned());
    let connection_id = ConnectionId::new();
    let registry = state.registry.clone();
    let ctx = state.ctx.clone();
    let broadcast = state.broadcast.clone();

    ws.on_upgrade(move |socket| {
        run_ws_session(socket, connection_id, user_id, registry, ctx, broadcast)
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use scribe_agents::config::AgentConfigStore;
    use scribe_agents::registry::AgentRegistry;
    use scribe_cache::MemoryCache;
    use scribe_core::ConnectionId;
    use scribe_core::store::MemoryStore;
    use scribe_core::types::{AgentConfig, ExtractedEntity, IntentClassification};
    use scribe_engine::decision::DecisionEngine;
    use scribe_engine::dispatcher::Dispatcher;
    use scribe_engine::extract::StaticExtractor;
    use scribe_engine::pipeline::SegmentPipeline;
    use scribe_engine::queue::SegmentQueue;
    use scribe_engine::registry::SessionRegistry;
    use scribe_engine::{EventEmitter, SessionService};
    use scribe_rpc::context::{Caller, RpcContext};
    use scribe_rpc::handlers::register_methods;
    use scribe_rpc::registry::MethodRegistry;
    use std::collections::HashSet;
    use tokio_util::sync::CancellationToken;

    pub struct TestStack {
        pub methods: Arc<MethodRegistry>,
        pub ctx: Arc<RpcContext>,
        pub caller: Caller,
    }

    /// Full in-memory service graph: static extractor with a medication
    /// entity and the prescription agent configured on the entity path.
    pub fn make_test_stack() -> TestStack {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let emitter = Arc::new(EventEmitter::new());

        let extractor = Arc::new(StaticExtractor::new(
            vec![ExtractedEntity {
                category: "MedicationName".into(),
                text: "Amoxicillin".into(),
                confidence: 0.9,
            }],
            IntentClassification::single("General", 0.3),
        ));
        let configs = Arc::new(AgentConfigStore::new());
        configs.set(
            "prescription",
            AgentConfig {
                enabled: true,
                confidence_threshold: 0.8,
                triggering_intents: HashSet::new(),
                required_entities: ["MedicationName".to_owned()]
                    .into_iter()
                    .collect::<HashSet<_>>(),
            },
        );

        let pipeline = Arc::new(SegmentPipeline::new(
            extractor,
            DecisionEngine::new(Arc::new(AgentRegistry::builtin()), configs),
            Dispatcher::new(store.clone()),
            store.clone(),
        ));
        let queue = SegmentQueue::start(
            pipeline,
            emitter.clone(),
            16,
            1,
            CancellationToken::new(),
        );
        let sessions = Arc::new(SessionService::new(
            store.clone(),
            cache,
            Arc::new(SessionRegistry::new()),
            emitter,
            queue,
            Duration::from_secs(60),
        ));

        let mut methods = MethodRegistry::new();
        register_methods(&mut methods);

        TestStack {
            methods: Arc::new(methods),
            ctx: Arc::new(RpcContext {
                sessions,
                store,
            }),
            caller: Caller::new(ConnectionId::from("conn_test"), "user_test"),
        }
    }
}
