//! Generic action item agent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use scribe_core::ActionId;
use scribe_core::types::{ActionItem, AgentResult};

use crate::agent::{AgentError, AgentHandler};
use crate::context::SegmentContext;

/// Captures the segment as a `task` action item when the intent
/// classification says the utterance asks for something to be done.
pub struct ActionItemAgent;

#[async_trait]
impl AgentHandler for ActionItemAgent {
    fn name(&self) -> &str {
        "action_item"
    }

    async fn process(&self, ctx: Arc<SegmentContext>) -> Result<AgentResult, AgentError> {
        let text = ctx.segment.text.trim();
        if text.is_empty() {
            return Err(AgentError::Generation("empty segment text".into()));
        }

        let action = ActionItem {
            id: ActionId::new(),
            session_id: ctx.segment.session_id.clone(),
            text: text.to_owned(),
            category: "task".into(),
            generated_by: self.name().into(),
            created_at: Utc::now(),
        };

        Ok(AgentResult {
            documents: Vec::new(),
            actions: vec![action],
            confidence: ctx.top_intent().confidence,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::make_context;

    #[tokio::test]
    async fn captures_segment_as_task() {
        let ctx = Arc::new(make_context(
            "Order a chest X-ray",
            "ActionItem",
            0.82,
            vec![],
        ));
        let result = ActionItemAgent.process(ctx).await.unwrap();

        let action = &result.actions[0];
        assert_eq!(action.category, "task");
        assert_eq!(action.text, "Order a chest X-ray");
        assert_eq!(action.generated_by, "action_item");
        assert!((result.confidence - 0.82).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn trims_whitespace() {
        let ctx = Arc::new(make_context("  refill thyroid meds  ", "Task", 0.8, vec![]));
        let result = ActionItemAgent.process(ctx).await.unwrap();
        assert_eq!(result.actions[0].text, "refill thyroid meds");
    }

    #[tokio::test]
    async fn fails_on_blank_text() {
        let ctx = Arc::new(make_context("   ", "Task", 0.8, vec![]));
        let err = ActionItemAgent.process(ctx).await.unwrap_err();
        assert!(err.to_string().contains("empty segment text"));
    }
}
