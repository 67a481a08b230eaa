//! Visit summary agent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use scribe_core::DocumentId;
use scribe_core::types::{AgentResult, GeneratedDocument};

use crate::agent::{AgentError, AgentHandler};
use crate::context::SegmentContext;

/// Produces a `visit_summary` document draft for the segment: the
/// speaker-attributed text plus the entity mentions found in it.
pub struct SummaryAgent;

#[async_trait]
impl AgentHandler for SummaryAgent {
    fn name(&self) -> &str {
        "summary"
    }

    async fn process(&self, ctx: Arc<SegmentContext>) -> Result<AgentResult, AgentError> {
        let segment = &ctx.segment;
        let mut content = format!("{}: {}", segment.speaker, segment.text);
        if !ctx.entities.is_empty() {
            let mentions = ctx
                .entities
                .iter()
                .map(|e| format!("{} ({})", e.text, e.category))
                .collect::<Vec<_>>()
                .join(", ");
            content.push_str("\nMentions: ");
            content.push_str(&mentions);
        }

        let document = GeneratedDocument {
            id: DocumentId::new(),
            session_id: segment.session_id.clone(),
            doc_type: "visit_summary".into(),
            content,
            generated_by: self.name().into(),
            created_at: Utc::now(),
        };

        Ok(AgentResult {
            documents: vec![document],
            actions: Vec::new(),
            confidence: segment.confidence,
            error: None,
        })
    }
}
