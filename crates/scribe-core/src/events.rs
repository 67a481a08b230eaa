//! Domain events broadcast to realtime subscribers.
//!
//! [`ScribeEvent`]s flow over the in-process event bus
//! (`tokio::sync::broadcast`) and are converted to the wire format by the
//! server's event bridge before fan-out to a session's connections. Event
//! type tags here use snake_case; the bridge maps them to dotted wire names
//! (`segment.received`, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ActionItem, GeneratedDocument};

/// Fields shared by every event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEvent {
    /// Session this event belongs to.
    pub session_id: String,
    /// ISO 8601 timestamp.
    pub timestamp: String,
}

impl BaseEvent {
    /// Create a new base event with the current UTC timestamp.
    #[must_use]
    pub fn now(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Events emitted by the session lifecycle and the segment pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ScribeEvent {
    /// A connection started (or joined) a session.
    SessionStarted {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Owning user.
        owner_id: String,
        /// Client-supplied session metadata.
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<Value>,
    },

    /// A session was explicitly stopped.
    SessionStopped {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
    },

    /// A segment was persisted. Always emitted before any event produced
    /// by that segment's orchestration pass.
    SegmentReceived {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Segment identifier.
        id: String,
        /// Transcribed text.
        text: String,
        /// Speaker label.
        speaker: String,
        /// Transcription confidence.
        confidence: f64,
        /// Sequence number within the session.
        sequence: u64,
    },

    /// An agent was dispatched for a segment.
    AgentActivated {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Agent name.
        agent_name: String,
        /// The confidence that agent reported.
        confidence: f64,
    },

    /// An agent generated a document.
    DocumentGenerated {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// The generated document.
        document: GeneratedDocument,
    },

    /// An agent generated an action item.
    ActionGenerated {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// The generated action.
        action: ActionItem,
    },

    /// An orchestration pass finished.
    ProcessingCompleted {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Names of every dispatched agent.
        triggered_agents: Vec<String>,
        /// Number of documents generated in the pass.
        document_count: usize,
        /// Number of actions generated in the pass.
        action_count: usize,
        /// Mean confidence across dispatched agents.
        overall_confidence: f64,
    },

    /// An orchestration pass failed before dispatch (no partial output).
    ProcessingError {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// What went wrong.
        message: String,
    },

    /// A non-processing error surfaced to the session's subscribers.
    Error {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// What went wrong.
        message: String,
    },
}

impl ScribeEvent {
    /// Internal event type tag (snake_case, matches the serde tag).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::SessionStopped { .. } => "session_stopped",
            Self::SegmentReceived { .. } => "segment_received",
            Self::AgentActivated { .. } => "agent_activated",
            Self::DocumentGenerated { .. } => "document_generated",
            Self::ActionGenerated { .. } => "action_generated",
            Self::ProcessingCompleted { .. } => "processing_completed",
            Self::ProcessingError { .. } => "processing_error",
            Self::Error { .. } => "error",
        }
    }

    /// Session the event belongs to.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.base().session_id
    }

    /// Event timestamp (ISO 8601).
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.base().timestamp
    }

    fn base(&self) -> &BaseEvent {
        match self {
            Self::SessionStarted { base, .. }
            | Self::SessionStopped { base }
            | Self::SegmentReceived { base, .. }
            | Self::AgentActivated { base, .. }
            | Self::DocumentGenerated { base, .. }
            | Self::ActionGenerated { base, .. }
            | Self::ProcessingCompleted { base, .. }
            | Self::ProcessingError { base, .. }
            | Self::Error { base, .. } => base,
        }
    }
}

/// Create a processing-error event.
#[must_use]
pub fn processing_error_event(
    session_id: impl Into<String>,
    message: impl Into<String>,
) -> ScribeEvent {
    ScribeEvent::ProcessingError {
        base: BaseEvent::now(session_id),
        message: message.into(),
    }
}

/// Create a session-stopped event.
#[must_use]
pub fn session_stopped_event(session_id: impl Into<String>) -> ScribeEvent {
    ScribeEvent::SessionStopped {
        base: BaseEvent::now(session_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DocumentId, SessionId};

    #[test]
    fn base_event_now_sets_timestamp() {
        let base = BaseEvent::now("s1");
        assert_eq!(base.session_id, "s1");
        assert!(!base.timestamp.is_empty());
    }

    #[test]
    fn event_type_and_session_id() {
        let e = session_stopped_event("sess-1");
        assert_eq!(e.event_type(), "session_stopped");
        assert_eq!(e.session_id(), "sess-1");
        assert!(!e.timestamp().is_empty());
    }

    #[test]
    fn serde_tag_and_flattened_base() {
        let e = ScribeEvent::AgentActivated {
            base: BaseEvent::now("sess-1"),
            agent_name: "prescription".into(),
            confidence: 0.9,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "agent_activated");
        assert_eq!(v["sessionId"], "sess-1");
        assert_eq!(v["agentName"], "prescription");
        assert_eq!(v["confidence"], 0.9);
    }

    #[test]
    fn segment_received_fields() {
        let e = ScribeEvent::SegmentReceived {
            base: BaseEvent::now("sess-1"),
            id: "seg-1".into(),
            text: "hello".into(),
            speaker: "patient".into(),
            confidence: 0.85,
            sequence: 7,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["type"], "segment_received");
        assert_eq!(v["id"], "seg-1");
        assert_eq!(v["speaker"], "patient");
        assert_eq!(v["sequence"], 7);
    }

    #[test]
    fn processing_completed_fields() {
        let e = ScribeEvent::ProcessingCompleted {
            base: BaseEvent::now("sess-1"),
            triggered_agents: vec!["summary".into()],
            document_count: 1,
            action_count: 0,
            overall_confidence: 0.8,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["triggeredAgents"][0], "summary");
        assert_eq!(v["documentCount"], 1);
        assert_eq!(v["actionCount"], 0);
        assert_eq!(v["overallConfidence"], 0.8);
    }

    #[test]
    fn document_generated_embeds_document() {
        let e = ScribeEvent::DocumentGenerated {
            base: BaseEvent::now("sess-1"),
            document: GeneratedDocument {
                id: DocumentId::from("doc-1"),
                session_id: SessionId::from("sess-1"),
                doc_type: "visit_summary".into(),
                content: "...".into(),
                generated_by: "summary".into(),
                created_at: chrono::Utc::now(),
            },
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["document"]["type"], "visit_summary");
        assert_eq!(v["document"]["generatedBy"], "summary");
    }

    #[test]
    fn session_started_omits_missing_meta() {
        let e = ScribeEvent::SessionStarted {
            base: BaseEvent::now("s1"),
            owner_id: "u1".into(),
            meta: None,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert!(v.get("meta").is_none());
        assert_eq!(v["ownerId"], "u1");
    }

    #[test]
    fn roundtrip_every_variant() {
        let base = BaseEvent::now("s1");
        let events = vec![
            ScribeEvent::SessionStarted {
                base: base.clone(),
                owner_id: "u1".into(),
                meta: Some(serde_json::json!({"k": "v"})),
            },
            ScribeEvent::SessionStopped { base: base.clone() },
            ScribeEvent::SegmentReceived {
                base: base.clone(),
                id: "seg".into(),
                text: "t".into(),
                speaker: "s".into(),
                confidence: 0.5,
                sequence: 1,
            },
            ScribeEvent::AgentActivated {
                base: base.clone(),
                agent_name: "a".into(),
                confidence: 0.5,
            },
            ScribeEvent::ProcessingCompleted {
                base: base.clone(),
                triggered_agents: vec![],
                document_count: 0,
                action_count: 0,
                overall_confidence: 0.0,
            },
            processing_error_event("s1", "boom"),
            ScribeEvent::Error {
                base,
                message: "oops".into(),
            },
        ];
        for e in &events {
            let json = serde_json::to_string(e).unwrap();
            let back: ScribeEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(&back, e);
        }
    }
}
