//! Concurrent agent dispatch with per-agent failure isolation.

use std::sync::Arc;
use std::time::Instant;

use scribe_agents::context::SegmentContext;
use scribe_core::SessionId;
use scribe_core::store::Persistence;
use scribe_core::types::{AggregatedResponse, AgentResult, AuditRecord, TriggeredAgent};
use tracing::{instrument, warn};

use crate::decision::Activation;

/// Executes activated agents concurrently and aggregates their output.
pub struct Dispatcher {
    store: Arc<dyn Persistence>,
}

impl Dispatcher {
    /// Create a dispatcher over the persistence collaborator.
    #[must_use]
    pub fn new(store: Arc<dyn Persistence>) -> Self {
        Self { store }
    }

    /// Run every activated agent on its own task and aggregate the results.
    ///
    /// A panic or `Err` from one agent becomes a zero-confidence
    /// [`AgentResult::failure`] for that agent only; siblings are never
    /// cancelled. All invocations are awaited before aggregation. Generated
    /// artifacts are tagged with the session id and persisted before they
    /// appear in the response; every invocation writes an audit record.
    #[instrument(skip_all, fields(session_id = %session_id, agents = activations.len()))]
    pub async fn run(
        &self,
        session_id: &SessionId,
        ctx: Arc<SegmentContext>,
        activations: Vec<Activation>,
    ) -> AggregatedResponse {
        if activations.is_empty() {
            return AggregatedResponse::empty();
        }

        let mut handles = Vec::with_capacity(activations.len());
        for activation in activations {
            let agent = activation.agent;
            let name = agent.name().to_owned();
            let ctx = ctx.clone();
            let handle = tokio::spawn(async move {
                let start = Instant::now();
                let result = agent.process(ctx).await;
                (result, start.elapsed())
            });
            handles.push((name, handle));
        }

        let mut response = AggregatedResponse::default();
        let mut confidence_sum = 0.0;
        let dispatched = handles.len();

        for (name, handle) in handles {
            let (result, duration_ms) = match handle.await {
                Ok((Ok(result), elapsed)) => {
                    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                    let result = self.persist_artifacts(session_id, &name, result).await;
                    (result, elapsed_ms)
                }
                Ok((Err(err), elapsed)) => {
                    warn!(agent = %name, error = %err, "agent failed");
                    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                    (AgentResult::failure(err.to_string()), elapsed_ms)
                }
                Err(join_err) => {
                    warn!(agent = %name, error = %join_err, "agent task aborted");
                    (AgentResult::failure(format!("agent task aborted: {join_err}")), 0)
                }
            };

            let audit = AuditRecord::agent(
                session_id.clone(),
                name.clone(),
                !result.is_failure(),
                duration_ms,
                result.confidence,
                result.error.clone(),
            );
            if let Err(e) = self.store.save_audit_record(&audit).await {
                warn!(agent = %name, error = %e, "failed to persist agent audit record");
            }

            confidence_sum += result.confidence;
            response.triggered.push(TriggeredAgent {
                name,
                confidence: result.confidence,
            });
            response.documents.extend(result.documents);
            response.actions.extend(result.actions);
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = confidence_sum / dispatched as f64;
        response.confidence = mean;
        response
    }

    /// Tag and persist an agent's artifacts.
    ///
    /// A persistence failure downgrades the agent to a failure result so
    /// that the response never references artifacts that were not stored.
    async fn persist_artifacts(
        &self,
        session_id: &SessionId,
        agent_name: &str,
        mut result: AgentResult,
    ) -> AgentResult {
        for document in &mut result.documents {
            document.session_id = session_id.clone();
        }
        for action in &mut result.actions {
            action.session_id = session_id.clone();
        }

        for document in &result.documents {
            if let Err(e) = self.store.save_document(document).await {
                warn!(agent = agent_name, error = %e, "failed to persist document");
                return AgentResult::failure(format!("failed to persist document: {e}"));
            }
        }
        for action in &result.actions {
            if let Err(e) = self.store.save_action(action).await {
                warn!(agent = agent_name, error = %e, "failed to persist action");
                return AgentResult::failure(format!("failed to persist action: {e}"));
            }
        }
        result
    }
}
