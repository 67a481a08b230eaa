//! Extraction context an agent processes.

use scribe_core::types::{ExtractedEntity, Intent, IntentClassification, SpeechSegment};

/// A segment plus the entity/intent extraction results for it.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentContext {
    /// The segment being processed.
    pub segment: SpeechSegment,
    /// Entities extracted from the segment text.
    pub entities: Vec<ExtractedEntity>,
    /// Intent classification for the segment.
    pub intent: IntentClassification,
}

impl SegmentContext {
    /// Create a context.
    #[must_use]
    pub fn new(
        segment: SpeechSegment,
        entities: Vec<ExtractedEntity>,
        intent: IntentClassification,
    ) -> Self {
        Self {
            segment,
            entities,
            intent,
        }
    }

    /// The winning intent hypothesis.
    #[must_use]
    pub fn top_intent(&self) -> &Intent {
        &self.intent.top
    }

    /// Whether any extracted entity has the given category.
    #[must_use]
    pub fn has_entity(&self, category: &str) -> bool {
        self.entities.iter().any(|e| e.category == category)
    }

    /// All extracted entities of the given category.
    pub fn entities_in<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a ExtractedEntity> {
        self.entities.iter().filter(move |e| e.category == category)
    }
}
