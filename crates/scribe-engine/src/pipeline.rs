//! Per-segment orchestration entry point.

use std::sync::Arc;
use std::time::Instant;

use scribe_agents::context::SegmentContext;
use scribe_core::store::Persistence;
use scribe_core::types::{AggregatedResponse, AuditRecord, SpeechSegment};
use tracing::{instrument, warn};

use crate::decision::DecisionEngine;
use crate::dispatcher::Dispatcher;
use crate::errors::EngineError;
use crate::extract::EntityIntentExtractor;

/// Composes extraction, decision, and dispatch into one per-segment pass.
pub struct SegmentPipeline {
    extractor: Arc<dyn EntityIntentExtractor>,
    decision: DecisionEngine,
    dispatcher: Dispatcher,
    store: Arc<dyn Persistence>,
}

impl SegmentPipeline {
    /// Assemble a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        extractor: Arc<dyn EntityIntentExtractor>,
        decision: DecisionEngine,
        dispatcher: Dispatcher,
        store: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            extractor,
            decision,
            dispatcher,
            store,
        }
    }

    /// Run one orchestration pass over a persisted segment.
    ///
    /// An extraction failure is orchestration-fatal: no agents are
    /// dispatched and the error propagates to the caller. Either way a
    /// whole-pass audit record is written.
    #[instrument(skip_all, fields(session_id = %segment.session_id, segment_id = %segment.id))]
    pub async fn process(
        &self,
        segment: SpeechSegment,
    ) -> Result<AggregatedResponse, EngineError> {
        let session_id = segment.session_id.clone();
        let start = Instant::now();

        let outcome = self.run_pass(segment).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let audit = match &outcome {
            Ok(response) => AuditRecord::pass(
                session_id,
                true,
                duration_ms,
                Some(response.confidence),
                None,
            ),
            Err(err) => {
                AuditRecord::pass(session_id, false, duration_ms, None, Some(err.to_string()))
            }
        };
        if let Err(e) = self.store.save_audit_record(&audit).await {
            warn!(error = %e, "failed to persist pass audit record");
        }

        outcome
    }

    async fn run_pass(
        &self,
        segment: SpeechSegment,
    ) -> Result<AggregatedResponse, EngineError> {
        let entities = self.extractor.extract_entities(&segment.text).await?;
        let intent = self.extractor.classify_intent(&segment, &entities).await?;

        let session_id = segment.session_id.clone();
        let ctx = Arc::new(SegmentContext::new(segment, entities, intent));
        let activations = self.decision.select(&ctx);

        Ok(self.dispatcher.run(&session_id, ctx, activations).await)
    }
}
