//! The agent capability trait.

use std::sync::Arc;

use async_trait::async_trait;
use scribe_core::types::{AgentConfig, AgentResult};

use crate::context::SegmentContext;

/// Errors an agent can raise while processing. These never escape the
/// dispatcher — they are downgraded to a zero-confidence result.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The agent could not produce its artifacts from this context.
    #[error("generation failed: {0}")]
    Generation(String),
}

/// A pluggable capability unit: activation check plus processing.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Unique agent name, matching its config key 1:1.
    fn name(&self) -> &str;

    /// Whether the agent should fire for this segment.
    ///
    /// Default rule: the agent is enabled, AND either the top intent is one
    /// of its triggering intents with confidence at or above the threshold,
    /// OR any extracted entity falls in a required category. The entity
    /// path ignores the confidence threshold entirely.
    fn should_activate(&self, config: &AgentConfig, ctx: &SegmentContext) -> bool {
        if !config.enabled {
            return false;
        }
        let intent = ctx.top_intent();
        let intent_match = config.triggering_intents.contains(&intent.category)
            && intent.confidence >= config.confidence_threshold;
        let entity_match = ctx
            .entities
            .iter()
            .any(|e| config.required_entities.contains(&e.category));
        intent_match || entity_match
    }

    /// Generate artifacts from the segment context.
    async fn process(&self, ctx: Arc<SegmentContext>) -> Result<AgentResult, AgentError>;
}
