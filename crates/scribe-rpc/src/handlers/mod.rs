//! RPC method handlers for the inbound operation surface.

pub mod query;
pub mod segment;
pub mod session;

use serde_json::Value;

use crate::errors::RpcError;
use crate::registry::MethodRegistry;

/// Register every inbound operation on the given registry.
pub fn register_methods(registry: &mut MethodRegistry) {
    registry.register("session.start", session::StartSessionHandler);
    registry.register("session.stop", session::StopSessionHandler);
    registry.register("session.delete", session::DeleteSessionHandler);
    registry.register("segment.process", segment::ProcessSegmentHandler);
    registry.register("session.history", query::SessionHistoryHandler);
    registry.register("session.list", query::UserSessionsHandler);
    registry.register("session.snapshot", query::SessionSnapshotHandler);
}

/// Extract a required string parameter.
pub(crate) fn require_string_param(
    params: Option<&Value>,
    key: &str,
) -> Result<String, RpcError> {
    params
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
        .ok_or_else(|| RpcError::InvalidParams {
            message: format!("Missing required parameter '{key}'"),
        })
}

/// Extract an optional string parameter.
pub(crate) fn optional_string_param(params: Option<&Value>, key: &str) -> Option<String> {
    params
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
}

/// Extract an optional unsigned integer parameter.
pub(crate) fn optional_usize_param(params: Option<&Value>, key: &str) -> Option<usize> {
    params
        .and_then(|p| p.get(key))
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
}

#[cfg(test)]
pub(crate) mod test_helpers {
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
    use std::collections::HashSet;
    use tokio_util::sync::CancellationToken;

    use crate::context::{Caller, RpcContext};

    /// Context over in-memory collaborators: a static extractor that finds
    /// a medication entity with a low-confidence General intent, and the
    /// prescription agent configured on the entity path.
    pub fn make_test_context() -> RpcContext {
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

        RpcContext {
            sessions,
            store,
        }
    }

    pub fn make_test_caller() -> Caller {
        Caller::new(ConnectionId::from("conn_test"), "user_test")
    }
}
