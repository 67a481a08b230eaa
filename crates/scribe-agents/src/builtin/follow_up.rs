//! Follow-up scheduling agent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use scribe_core::ActionId;
use scribe_core::types::{ActionItem, AgentResult};

use crate::agent::{AgentError, AgentHandler};
use crate::context::SegmentContext;

/// Produces a `follow_up` action item, anchored to a temporal entity
/// (`Date` or `Duration`) when one was extracted.
pub struct FollowUpAgent;

#[async_trait]
impl AgentHandler for FollowUpAgent {
    fn name(&self) -> &str {
        "follow_up"
    }

    async fn process(&self, ctx: Arc<SegmentContext>) -> Result<AgentResult, AgentError> {
        let anchor = ctx
            .entities_in("Date")
            .chain(ctx.entities_in("Duration"))
            .next();

        let (text, confidence) = match anchor {
            Some(entity) => (
                format!("Schedule follow-up: {}", entity.text),
                entity.confidence,
            ),
            None => (
                "Schedule follow-up visit".to_owned(),
                ctx.top_intent().confidence,
            ),
        };

        let action = ActionItem {
            id: ActionId::new(),
            session_id: ctx.segment.session_id.clone(),
            text,
            category: "follow_up".into(),
            generated_by: self.name().into(),
            created_at: Utc::now(),
        };

        Ok(AgentResult {
            documents: Vec::new(),
            actions: vec![action],
            confidence,
            error: None,
        })
    }
}
