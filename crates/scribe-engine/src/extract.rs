//! Entity/intent extraction port.
//!
//! The actual NLP models live behind this trait and are external
//! collaborators. [`StaticExtractor`] is the deterministic stand-in used by
//! tests and local runs.

use async_trait::async_trait;
use scribe_core::types::{ExtractedEntity, IntentClassification, SpeechSegment};

/// Errors surfaced by an extraction backend. A failure here aborts the
/// whole segment pass.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The backend rejected or failed the call.
    #[error("extraction backend error: {0}")]
    Backend(String),
}

/// Entity and intent extraction collaborator.
#[async_trait]
pub trait EntityIntentExtractor: Send + Sync {
    /// Extract labeled entities from segment text.
    async fn extract_entities(&self, text: &str) -> Result<Vec<ExtractedEntity>, ExtractError>;

    /// Classify the segment's intent given its entities.
    async fn classify_intent(
        &self,
        segment: &SpeechSegment,
        entities: &[ExtractedEntity],
    ) -> Result<IntentClassification, ExtractError>;
}

/// Extractor returning fixed results regardless of input.
pub struct StaticExtractor {
    entities: Vec<ExtractedEntity>,
    intent: IntentClassification,
}

impl StaticExtractor {
    /// Extractor that always returns the given entities and intent.
    #[must_use]
    pub fn new(entities: Vec<ExtractedEntity>, intent: IntentClassification) -> Self {
        Self { entities, intent }
    }
}

impl Default for StaticExtractor {
    /// No entities, a zero-confidence `General` intent: nothing activates.
    fn default() -> Self {
        Self::new(Vec::new(), IntentClassification::single("General", 0.0))
    }
}

#[async_trait]
impl EntityIntentExtractor for StaticExtractor {
    async fn extract_entities(&self, _text: &str) -> Result<Vec<ExtractedEntity>, ExtractError> {
        Ok(self.entities.clone())
    }

    async fn classify_intent(
        &self,
        _segment: &SpeechSegment,
        _entities: &[ExtractedEntity],
    ) -> Result<IntentClassification, ExtractError> {
        Ok(self.intent.clone())
    }
}

/// Extractor that always fails. Exercises the orchestration-fatal path.
pub struct FailingExtractor;

#[async_trait]
impl EntityIntentExtractor for FailingExtractor {
    async fn extract_entities(&self, _text: &str) -> Result<Vec<ExtractedEntity>, ExtractError> {
        Err(ExtractError::Backend("extractor unavailable".into()))
    }

    async fn classify_intent(
        &self,
        _segment: &SpeechSegment,
        _entities: &[ExtractedEntity],
    ) -> Result<IntentClassification, ExtractError> {
        Err(ExtractError::Backend("extractor unavailable".into()))
    }
}
