//! Event bridge — converts domain [`ScribeEvent`]s from the engine's bus
//! into wire [`RpcEvent`]s and routes them through the
//! [`BroadcastManager`] to the owning session's connections.

use std::sync::Arc;

use scribe_core::events::ScribeEvent;
use scribe_rpc::types::RpcEvent;
use tokio::sync::broadcast;

use super::broadcast::BroadcastManager;

/// Bridges engine events to WebSocket clients.
pub struct EventBridge {
    rx: broadcast::Receiver<ScribeEvent>,
    broadcast: Arc<BroadcastManager>,
}

impl EventBridge {
    /// Create a new event bridge.
    pub fn new(rx: broadcast::Receiver<ScribeEvent>, broadcast: Arc<BroadcastManager>) -> Self {
        Self { rx, broadcast }
    }

    /// Run the bridge loop. Exits when the emitter is dropped.
    #[tracing::instrument(skip_all, name = "event_bridge")]
    pub async fn run(mut self) {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    tracing::debug!(event_type = event.event_type(), "bridging event to clients");
                    let session_id = event.session_id().to_owned();
                    let rpc_event = wire_event(&event);

                    if session_id.is_empty() {
                        self.broadcast.broadcast_all(&rpc_event).await;
                    } else {
                        self.broadcast
                            .broadcast_to_session(&session_id, &rpc_event)
                            .await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event bridge lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("event bridge: emitter closed, exiting");
                    break;
                }
            }
        }
    }
}

/// Convert a domain event to the wire format.
pub fn wire_event(event: &ScribeEvent) -> RpcEvent {
    let data = match event {
        ScribeEvent::SessionStarted { owner_id, meta, .. } => {
            let mut data = serde_json::json!({ "ownerId": owner_id });
            if let Some(meta) = meta {
                data["meta"] = meta.clone();
            }
            Some(data)
        }
        ScribeEvent::SessionStopped { .. } => None,
        ScribeEvent::SegmentReceived {
            id,
            text,
            speaker,
            confidence,
            sequence,
            ..
        } => Some(serde_json::json!({
            "id": id,
            "text": text,
            "speaker": speaker,
            "confidence": confidence,
            "sequence": sequence,
        })),
        ScribeEvent::AgentActivated {
            agent_name,
            confidence,
            ..
        } => Some(serde_json::json!({
            "agentName": agent_name,
            "confidence": confidence,
        })),
        ScribeEvent::DocumentGenerated { document, .. } => Some(serde_json::json!({
            "id": document.id.as_str(),
            "type": &document.doc_type,
            "content": &document.content,
            "generatedBy": &document.generated_by,
        })),
        ScribeEvent::ActionGenerated { action, .. } => Some(serde_json::json!({
            "id": action.id.as_str(),
            "text": &action.text,
            "category": &action.category,
            "generatedBy": &action.generated_by,
        })),
        ScribeEvent::ProcessingCompleted {
            triggered_agents,
            document_count,
            action_count,
            overall_confidence,
            ..
        } => Some(serde_json::json!({
            "triggeredAgents": triggered_agents,
            "documentCount": document_count,
            "actionCount": action_count,
            "overallConfidence": overall_confidence,
        })),
        ScribeEvent::ProcessingError { message, .. } | ScribeEvent::Error { message, .. } => {
            Some(serde_json::json!({ "message": message }))
        }
    };

    // Map internal event types to wire format.
    let wire_type = match event.event_type() {
        "session_started" => "session.started",
        "session_stopped" => "session.stopped",
        "segment_received" => "segment.received",
        "agent_activated" => "agent.activated",
        "document_generated" => "document.generated",
        "action_generated" => "action.generated",
        "processing_completed" => "processing.completed",
        "processing_error" => "processing.error",
        other => other,
    };

    let session_id = event.session_id();
    RpcEvent {
        event_type: wire_type.to_owned(),
        session_id: if session_id.is_empty() {
            None
        } else {
            Some(session_id.to_owned())
        },
        timestamp: event.timestamp().to_owned(),
        data,
    }
}
