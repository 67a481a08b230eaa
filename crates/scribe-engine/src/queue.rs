//! Bounded work queue for detached orchestration passes.
//!
//! `ProcessSegment` returns to the caller as soon as the segment is
//! persisted and the lightweight broadcast is out; the orchestration pass
//! itself runs here. The queue makes the detached path explicit: a bounded
//! channel (back-pressure surfaces as [`EngineError::QueueFull`]) drained
//! by a fixed worker pool. Cancelling the token stops workers from picking
//! up new segments; an in-flight pass runs to completion.

use std::sync::Arc;

use scribe_core::events::{BaseEvent, ScribeEvent, processing_error_event};
use scribe_core::types::{AggregatedResponse, SpeechSegment};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::emitter::EventEmitter;
use crate::errors::EngineError;
use crate::pipeline::SegmentPipeline;

/// Handle to the segment work queue.
pub struct SegmentQueue {
    tx: mpsc::Sender<SpeechSegment>,
    workers: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl SegmentQueue {
    /// Start `workers` worker tasks draining a channel of `capacity`.
    #[must_use]
    pub fn start(
        pipeline: Arc<SegmentPipeline>,
        emitter: Arc<EventEmitter>,
        capacity: usize,
        workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SpeechSegment>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker| {
                let pipeline = pipeline.clone();
                let emitter = emitter.clone();
                let rx = rx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    debug!(worker, "segment worker started");
                    loop {
                        let segment = tokio::select! {
                            () = cancel.cancelled() => break,
                            segment = async { rx.lock().await.recv().await } => {
                                match segment {
                                    Some(segment) => segment,
                                    None => break,
                                }
                            }
                        };
                        run_pass(&pipeline, &emitter, segment).await;
                    }
                    debug!(worker, "segment worker stopped");
                })
            })
            .collect();

        Self {
            tx,
            workers: handles,
            cancel,
        }
    }

    /// Enqueue a segment for a detached orchestration pass.
    ///
    /// Fails with [`EngineError::QueueFull`] when the back-pressure limit
    /// is reached, and with [`EngineError::Validation`] after shutdown.
    pub fn enqueue(&self, segment: SpeechSegment) -> Result<(), EngineError> {
        use mpsc::error::TrySendError;
        match self.tx.try_send(segment) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EngineError::QueueFull),
            Err(TrySendError::Closed(_)) => {
                Err(EngineError::Validation("segment queue is shut down".into()))
            }
        }
    }

    /// Number of worker tasks.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting work and wait for workers to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        drop(self.tx);
        for handle in self.workers {
            if let Err(e) = handle.await {
                error!(error = %e, "segment worker join failed");
            }
        }
        info!("segment queue drained");
    }
}

/// Run one pass and emit the follow-up events.
async fn run_pass(pipeline: &SegmentPipeline, emitter: &EventEmitter, segment: SpeechSegment) {
    let session_id = segment.session_id.to_string();

    match pipeline.process(segment).await {
        Ok(response) => emit_completion(emitter, &session_id, &response),
        Err(err) => {
            error!(session_id, category = err.category(), error = %err, "orchestration pass failed");
            emitter.emit(processing_error_event(session_id, err.to_string()));
        }
    }
}

fn emit_completion(emitter: &EventEmitter, session_id: &str, response: &AggregatedResponse) {
    for triggered in &response.triggered {
        emitter.emit(ScribeEvent::AgentActivated {
            base: BaseEvent::now(session_id),
            agent_name: triggered.name.clone(),
            confidence: triggered.confidence,
        });
    }
    for document in &response.documents {
        emitter.emit(ScribeEvent::DocumentGenerated {
            base: BaseEvent::now(session_id),
            document: document.clone(),
        });
    }
    for action in &response.actions {
        emitter.emit(ScribeEvent::ActionGenerated {
            base: BaseEvent::now(session_id),
            action: action.clone(),
        });
    }
    emitter.emit(ScribeEvent::ProcessingCompleted {
        base: BaseEvent::now(session_id),
        triggered_agents: response.triggered_agents(),
        document_count: response.documents.len(),
        action_count: response.actions.len(),
        overall_confidence: response.confidence,
    });
}
