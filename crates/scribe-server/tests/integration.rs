//! Full-stack tests: RPC dispatch through the method registry, the
//! detached orchestration pass, event bridging to the wire format, and
//! the HTTP surface.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use scribe_agents::config::AgentConfigStore;
use scribe_agents::registry::AgentRegistry;
use scribe_cache::MemoryCache;
use scribe_core::events::ScribeEvent;
use scribe_core::store::{MemoryStore, Persistence};
use scribe_core::types::{AgentConfig, ExtractedEntity, IntentClassification, SessionStatus};
use scribe_core::{ConnectionId, SessionId};
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
use scribe_rpc::types::RpcRequest;
use scribe_server::config::ServerConfig;
use scribe_server::server::ScribeServer;
use scribe_server::websocket::event_bridge::wire_event;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct Stack {
    methods: MethodRegistry,
    ctx: Arc<RpcContext>,
    store: Arc<MemoryStore>,
    emitter: Arc<EventEmitter>,
}

/// Extractor finds one medication entity with a low-confidence intent;
/// the prescription agent is configured on the entity path.
fn make_stack() -> Stack {
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
    let queue = SegmentQueue::start(pipeline, emitter.clone(), 16, 2, CancellationToken::new());
    let sessions = Arc::new(SessionService::new(
        store.clone(),
        cache,
        Arc::new(SessionRegistry::new()),
        emitter.clone(),
        queue,
        Duration::from_secs(60),
    ));

    let mut methods = MethodRegistry::new();
    register_methods(&mut methods);

    Stack {
        methods,
        ctx: Arc::new(RpcContext {
            sessions,
            store: store.clone(),
        }),
        store,
        emitter,
    }
}

fn request(id: &str, method: &str, params: serde_json::Value) -> RpcRequest {
    RpcRequest {
        id: id.into(),
        method: method.into(),
        params: Some(params),
    }
}

async fn next_event(
    rx: &mut tokio::sync::broadcast::Receiver<ScribeEvent>,
) -> ScribeEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event bus closed")
}

#[tokio::test]
async fn segment_flow_end_to_end() {
    let stack = make_stack();
    let caller = Caller::new(ConnectionId::from("conn_a"), "dr_jones");
    let mut rx = stack.emitter.subscribe();

    // Start the session.
    let resp = stack
        .methods
        .dispatch(
            request("r1", "session.start", json!({"sessionId": "enc_1"})),
            &caller,
            &stack.ctx,
        )
        .await;
    assert!(resp.success, "start failed: {:?}", resp.error);

    // Submit a segment; the handler returns before orchestration runs.
    let resp = stack
        .methods
        .dispatch(
            request(
                "r2",
                "segment.process",
                json!({
                    "sessionId": "enc_1",
                    "segment": {
                        "text": "Start Amoxicillin 500mg twice daily",
                        "speaker": "clinician",
                        "confidence": 0.92,
                        "sequence": 1,
                    },
                }),
            ),
            &caller,
            &stack.ctx,
        )
        .await;
    assert!(resp.success);
    assert_eq!(resp.result.unwrap()["queued"], true);

    // Event order: started, received, then the pass's broadcasts.
    let started = next_event(&mut rx).await;
    assert_eq!(started.event_type(), "session_started");

    let received = next_event(&mut rx).await;
    assert_eq!(received.event_type(), "segment_received");
    assert_eq!(wire_event(&received).event_type, "segment.received");

    let activated = next_event(&mut rx).await;
    assert_eq!(activated.event_type(), "agent_activated");
    let wire = wire_event(&activated);
    assert_eq!(wire.data.unwrap()["agentName"], "prescription");

    let document = next_event(&mut rx).await;
    assert_eq!(document.event_type(), "document_generated");
    let wire = wire_event(&document);
    assert_eq!(wire.data.unwrap()["type"], "prescription_draft");

    let completed = next_event(&mut rx).await;
    let wire = wire_event(&completed);
    assert_eq!(wire.event_type, "processing.completed");
    let data = wire.data.unwrap();
    assert_eq!(data["triggeredAgents"][0], "prescription");
    assert_eq!(data["documentCount"], 1);

    // History now shows the persisted artifacts.
    let resp = stack
        .methods
        .dispatch(
            request("r3", "session.history", json!({"sessionId": "enc_1"})),
            &caller,
            &stack.ctx,
        )
        .await;
    let result = resp.result.unwrap();
    assert_eq!(result["segments"].as_array().unwrap().len(), 1);
    assert_eq!(result["documents"].as_array().unwrap().len(), 1);

    // The pass and the agent invocation are both audited.
    let audits = stack.store.audit_records_for(&SessionId::from("enc_1"));
    assert_eq!(audits.len(), 2);
}

#[tokio::test]
async fn reconnect_and_disconnect_lifecycle() {
    let stack = make_stack();
    let conn_a = Caller::new(ConnectionId::from("conn_a"), "dr_jones");
    let conn_b = Caller::new(ConnectionId::from("conn_b"), "dr_jones");

    for caller in [&conn_a, &conn_b] {
        let resp = stack
            .methods
            .dispatch(
                request("r", "session.start", json!({"sessionId": "enc_1"})),
                caller,
                &stack.ctx,
            )
            .await;
        assert!(resp.success);
    }
    assert_eq!(stack.store.session_count(), 1);

    // The cached snapshot sees both connections.
    let resp = stack
        .methods
        .dispatch(
            request("r", "session.snapshot", json!({"sessionId": "enc_1"})),
            &conn_a,
            &stack.ctx,
        )
        .await;
    let connections = resp.result.unwrap()["connections"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(connections, 2);

    // First drop keeps the session active.
    stack.ctx.sessions.on_disconnect(&conn_a.connection_id).await;
    let session = stack
        .store
        .get_session(&SessionId::from("enc_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Active);

    // Last drop evicts the snapshot and marks the session disconnected.
    stack.ctx.sessions.on_disconnect(&conn_b.connection_id).await;
    let resp = stack
        .methods
        .dispatch(
            request("r", "session.snapshot", json!({"sessionId": "enc_1"})),
            &conn_a,
            &stack.ctx,
        )
        .await;
    assert!(!resp.success);
    assert_eq!(resp.error.unwrap().code, "NOT_FOUND");

    let session = stack
        .store
        .get_session(&SessionId::from("enc_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Disconnected);
}

#[tokio::test]
async fn stop_is_terminal() {
    let stack = make_stack();
    let caller = Caller::new(ConnectionId::from("conn_a"), "dr_jones");

    let _ = stack
        .methods
        .dispatch(
            request("r", "session.start", json!({"sessionId": "enc_1"})),
            &caller,
            &stack.ctx,
        )
        .await;
    let resp = stack
        .methods
        .dispatch(
            request("r", "session.stop", json!({"sessionId": "enc_1"})),
            &caller,
            &stack.ctx,
        )
        .await;
    assert_eq!(resp.result.unwrap()["status"], "completed");

    // A later join + drop never rewrites the terminal status.
    let straggler = Caller::new(ConnectionId::from("conn_x"), "dr_jones");
    let _ = stack
        .methods
        .dispatch(
            request("r", "session.start", json!({"sessionId": "enc_1"})),
            &straggler,
            &stack.ctx,
        )
        .await;
    stack
        .ctx
        .sessions
        .on_disconnect(&straggler.connection_id)
        .await;

    let session = stack
        .store
        .get_session(&SessionId::from("enc_1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
}

#[tokio::test]
async fn health_endpoint_reports_live_sessions() {
    let stack = make_stack();
    let caller = Caller::new(ConnectionId::from("conn_a"), "dr_jones");
    let _ = stack
        .methods
        .dispatch(
            request("r", "session.start", json!({"sessionId": "enc_1"})),
            &caller,
            &stack.ctx,
        )
        .await;

    let server = ScribeServer::new(ServerConfig::default(), make_methods(), stack.ctx.clone());
    let app = server.router();

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["active_sessions"], 1);
}

fn make_methods() -> MethodRegistry {
    let mut methods = MethodRegistry::new();
    register_methods(&mut methods);
    methods
}
