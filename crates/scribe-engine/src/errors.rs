//! Engine error types.

use scribe_core::store::StoreError;

use crate::extract::ExtractError;

/// Errors surfaced by the engine's session and pipeline operations.
///
/// Agent-level failures are NOT represented here: they never escape the
/// dispatcher and become zero-confidence results instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Request carried invalid input (e.g. empty segment text).
    #[error("{0}")]
    Validation(String),

    /// Caller does not own the session it is addressing.
    #[error("{0}")]
    Authorization(String),

    /// Unknown session id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Entity/intent extraction failed. Orchestration-fatal: the whole
    /// pass aborts with no partial agent output.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Persistence collaborator failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The segment work queue is full (back-pressure limit reached).
    #[error("segment queue full")]
    QueueFull,
}

impl EngineError {
    /// Error category string for logging and event emission.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authorization(_) => "authorization",
            Self::SessionNotFound(_) => "session_not_found",
            Self::Extraction(_) => "extraction",
            Self::Persistence(_) => "persistence",
            Self::QueueFull => "queue_full",
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<ExtractError> for EngineError {
    fn from(err: ExtractError) -> Self {
        Self::Extraction(err.to_string())
    }
}
