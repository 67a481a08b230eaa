//! Domain model: segments, extraction results, agent output, sessions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, DocumentId, SegmentId, SessionId};

/// A discrete unit of transcribed speech. Immutable once persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSegment {
    /// Segment identifier.
    pub id: SegmentId,
    /// Owning session.
    pub session_id: SessionId,
    /// Transcribed text.
    pub text: String,
    /// Speaker label (e.g. `"clinician"`, `"patient"`).
    pub speaker: String,
    /// Transcription confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Monotonic sequence number within the session.
    pub sequence: u64,
    /// When the speech was captured.
    pub timestamp: DateTime<Utc>,
}

/// A labeled text span extracted from a segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntity {
    /// Category label (e.g. `"MedicationName"`).
    pub category: String,
    /// The matched text span.
    pub text: String,
    /// Extraction confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

/// A single intent hypothesis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Intent category (e.g. `"Prescription"`).
    pub category: String,
    /// Classification confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

/// Intent classification result: the top hypothesis plus alternates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentClassification {
    /// The winning intent.
    pub top: Intent,
    /// Lower-ranked hypotheses, best first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<Intent>,
}

impl IntentClassification {
    /// Classification with a single hypothesis and no alternates.
    #[must_use]
    pub fn single(category: impl Into<String>, confidence: f64) -> Self {
        Self {
            top: Intent {
                category: category.into(),
                confidence,
            },
            alternates: Vec::new(),
        }
    }
}

/// Per-agent activation configuration, keyed by agent name in the config
/// store. An agent with no entry is disabled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Master switch for the agent.
    pub enabled: bool,
    /// Minimum top-intent confidence for the intent activation path.
    pub confidence_threshold: f64,
    /// Intent categories that trigger the agent.
    #[serde(default)]
    pub triggering_intents: HashSet<String>,
    /// Entity categories any one of which triggers the agent, regardless
    /// of intent confidence.
    #[serde(default)]
    pub required_entities: HashSet<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.7,
            triggering_intents: HashSet::new(),
            required_entities: HashSet::new(),
        }
    }
}

/// A document produced by an agent, owned by a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    /// Document identifier.
    pub id: DocumentId,
    /// Owning session.
    pub session_id: SessionId,
    /// Document type (e.g. `"visit_summary"`, `"prescription_draft"`).
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Document body.
    pub content: String,
    /// Name of the agent that produced it.
    pub generated_by: String,
    /// When the document was generated.
    pub created_at: DateTime<Utc>,
}

/// An action item produced by an agent, owned by a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    /// Action identifier.
    pub id: ActionId,
    /// Owning session.
    pub session_id: SessionId,
    /// What needs to be done.
    pub text: String,
    /// Action category (e.g. `"follow_up"`, `"task"`).
    pub category: String,
    /// Name of the agent that produced it.
    pub generated_by: String,
    /// When the action was generated.
    pub created_at: DateTime<Utc>,
}

/// Output of a single agent invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    /// Documents generated by the agent.
    #[serde(default)]
    pub documents: Vec<GeneratedDocument>,
    /// Action items generated by the agent.
    #[serde(default)]
    pub actions: Vec<ActionItem>,
    /// Agent confidence in its output, `[0.0, 1.0]`.
    pub confidence: f64,
    /// Error message when the invocation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    /// Degenerate zero-confidence result for a failed invocation.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            documents: Vec::new(),
            actions: Vec::new(),
            confidence: 0.0,
            error: Some(message.into()),
        }
    }

    /// Whether this result represents a failed invocation.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Per-agent record inside an [`AggregatedResponse`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredAgent {
    /// Agent name.
    pub name: String,
    /// The confidence that agent reported (0 for failures).
    pub confidence: f64,
}

/// Aggregated output of one dispatch pass over a segment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResponse {
    /// Every agent that was dispatched, including ones that failed.
    pub triggered: Vec<TriggeredAgent>,
    /// Union of generated documents across all results.
    pub documents: Vec<GeneratedDocument>,
    /// Union of generated action items across all results.
    pub actions: Vec<ActionItem>,
    /// Arithmetic mean of every dispatched agent's confidence (failures
    /// contribute 0), or 0 when no agent was dispatched.
    pub confidence: f64,
}

impl AggregatedResponse {
    /// Response for a pass in which no agent activated.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Names of every dispatched agent.
    #[must_use]
    pub fn triggered_agents(&self) -> Vec<String> {
        self.triggered.iter().map(|t| t.name.clone()).collect()
    }
}

/// Session lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// At least one start has happened and the session has not ended.
    Active,
    /// Explicitly stopped. Terminal: never overwritten by a disconnect.
    Completed,
    /// The last connection dropped while the session was active.
    Disconnected,
}

impl SessionStatus {
    /// Whether no further transitions are allowed from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A logical grouping of segments, connections, and generated artifacts
/// for one encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user.
    pub owner_id: String,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// When the session was first started.
    pub started_at: DateTime<Utc>,
    /// When the session was completed, if it has been.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A freshly started active session.
    #[must_use]
    pub fn active(id: SessionId, owner_id: impl Into<String>) -> Self {
        Self {
            id,
            owner_id: owner_id.into(),
            status: SessionStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
        }
    }
}

/// What a persisted audit record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditScope {
    /// A whole orchestration pass over one segment.
    Pass,
    /// A single agent invocation within a pass.
    Agent,
}

/// Traceability record for a processing attempt (whole pass or per agent).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Record identifier.
    pub id: String,
    /// Owning session.
    pub session_id: SessionId,
    /// Pass-level or agent-level.
    pub scope: AuditScope,
    /// Agent name for agent-level records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u64,
    /// Reported confidence, when the attempt produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Error or status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Record for a whole orchestration pass.
    #[must_use]
    pub fn pass(
        session_id: SessionId,
        success: bool,
        duration_ms: u64,
        confidence: Option<f64>,
        message: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            session_id,
            scope: AuditScope::Pass,
            agent_name: None,
            success,
            duration_ms,
            confidence,
            message,
            created_at: Utc::now(),
        }
    }

    /// Record for a single agent invocation.
    #[must_use]
    pub fn agent(
        session_id: SessionId,
        agent_name: impl Into<String>,
        success: bool,
        duration_ms: u64,
        confidence: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            session_id,
            scope: AuditScope::Agent,
            agent_name: Some(agent_name.into()),
            success,
            duration_ms,
            confidence: Some(confidence),
            message,
            created_at: Utc::now(),
        }
    }
}
