//! Session lifecycle service.
//!
//! Composes the registry, persistence, cache, event bus, and work queue
//! into the four gateway-facing operations: start, stop, disconnect, and
//! process-segment. State machine per session:
//! `Unregistered → Active` on start, `Active → Completed` on explicit stop
//! (terminal), `Active → Disconnected` when the last connection drops.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use scribe_cache::snapshot::{SessionSnapshot, snapshot_key};
use scribe_cache::SessionCache;
use scribe_core::events::{BaseEvent, ScribeEvent, session_stopped_event};
use scribe_core::store::Persistence;
use scribe_core::types::{
    ActionItem, GeneratedDocument, Session, SessionStatus, SpeechSegment,
};
use scribe_core::{ConnectionId, SegmentId, SessionId};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::emitter::EventEmitter;
use crate::errors::EngineError;
use crate::queue::SegmentQueue;
use crate::registry::SessionRegistry;

/// Incoming segment payload before persistence assigns identity.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDraft {
    /// Transcribed text. Must not be blank.
    pub text: String,
    /// Speaker label; defaults to `"unknown"`.
    #[serde(default)]
    pub speaker: Option<String>,
    /// Transcription confidence in `[0.0, 1.0]`; defaults to 1.0.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Sequence number within the session; defaults to 0.
    #[serde(default)]
    pub sequence: Option<u64>,
    /// Capture time; defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Everything a session owns, for history queries.
pub struct SessionHistory {
    /// The session row.
    pub session: Session,
    /// Segments in sequence order.
    pub segments: Vec<SpeechSegment>,
    /// Generated documents.
    pub documents: Vec<GeneratedDocument>,
    /// Generated actions.
    pub actions: Vec<ActionItem>,
}

/// Session/connection lifecycle over store + cache + registry + queue.
pub struct SessionService {
    store: Arc<dyn Persistence>,
    cache: Arc<dyn SessionCache>,
    registry: Arc<SessionRegistry>,
    emitter: Arc<EventEmitter>,
    queue: SegmentQueue,
    cache_ttl: Duration,
}

impl SessionService {
    /// Assemble the service from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn Persistence>,
        cache: Arc<dyn SessionCache>,
        registry: Arc<SessionRegistry>,
        emitter: Arc<EventEmitter>,
        queue: SegmentQueue,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            registry,
            emitter,
            queue,
            cache_ttl,
        }
    }

    /// The registry backing this service.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// The event bus this service emits on.
    #[must_use]
    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// Start a session (idempotently) and register the calling connection.
    ///
    /// Repeated starts with the same id never create a second persisted
    /// row; they add the caller to the session's connection group. An
    /// ephemeral snapshot is written with a sliding TTL and a start event
    /// is broadcast to the group.
    #[instrument(skip(self, meta), fields(connection_id = %connection_id, owner_id))]
    pub async fn start_session(
        &self,
        connection_id: &ConnectionId,
        owner_id: &str,
        session_id: Option<SessionId>,
        meta: Option<Value>,
    ) -> Result<Session, EngineError> {
        let session_id = session_id.unwrap_or_default();

        let session = match self.store.get_session(&session_id).await? {
            Some(existing) => {
                self.check_owner(&existing, owner_id)?;
                existing
            }
            None => {
                let session = Session::active(session_id.clone(), owner_id);
                self.store.upsert_session(&session).await?;
                info!(session_id = %session.id, "session created");
                session
            }
        };

        self.registry
            .register(connection_id.clone(), session_id.clone());
        self.write_snapshot(&session, meta.clone()).await;

        self.emitter.emit(ScribeEvent::SessionStarted {
            base: BaseEvent::now(session_id.as_str()),
            owner_id: session.owner_id.clone(),
            meta,
        });
        Ok(session)
    }

    /// Explicitly stop a session.
    ///
    /// Flips Active → Completed (terminal; repeated stops are no-ops on
    /// status), removes the calling connection, broadcasts a stop event,
    /// and evicts cache entries once the connection set drains.
    #[instrument(skip(self), fields(connection_id = %connection_id, session_id = %session_id))]
    pub async fn stop_session(
        &self,
        connection_id: &ConnectionId,
        owner_id: &str,
        session_id: &SessionId,
    ) -> Result<Session, EngineError> {
        let mut session = self.require_owned(session_id, owner_id).await?;

        if session.status == SessionStatus::Active {
            session.status = SessionStatus::Completed;
            session.ended_at = Some(Utc::now());
            self.store.upsert_session(&session).await?;
            info!(session_id = %session.id, "session completed");
        }

        let _ = self.registry.remove(connection_id);
        self.emitter.emit(session_stopped_event(session_id.as_str()));

        if self.registry.connection_count(session_id) == 0 {
            self.evict_snapshot(session_id).await;
        }
        Ok(session)
    }

    /// Handle a dropped connection.
    ///
    /// Resolves the owning session via the forward map; a connection that
    /// was never registered (or already removed) is a no-op. When the last
    /// connection drains, cache entries are evicted and the status flips
    /// Active → Disconnected — never overwriting Completed.
    #[instrument(skip(self), fields(connection_id = %connection_id))]
    pub async fn on_disconnect(&self, connection_id: &ConnectionId) {
        let Some(removal) = self.registry.remove(connection_id) else {
            return;
        };
        let session_id = removal.session_id;

        if !removal.emptied {
            self.refresh_snapshot_connections(&session_id).await;
            return;
        }

        self.evict_snapshot(&session_id).await;
        match self.store.get_session(&session_id).await {
            Ok(Some(mut session)) if session.status == SessionStatus::Active => {
                session.status = SessionStatus::Disconnected;
                if let Err(e) = self.store.upsert_session(&session).await {
                    warn!(session_id = %session_id, error = %e, "failed to mark session disconnected");
                } else {
                    info!(session_id = %session_id, "session disconnected");
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to load session on disconnect");
            }
        }
    }

    /// Persist a segment, broadcast the lightweight received event, and
    /// enqueue the detached orchestration pass.
    ///
    /// The received event is emitted before the enqueue, so it always
    /// precedes any broadcast produced by this segment's pass. The caller
    /// does not wait for orchestration.
    #[instrument(skip(self, draft), fields(session_id = %session_id))]
    pub async fn process_segment(
        &self,
        owner_id: &str,
        session_id: &SessionId,
        draft: SegmentDraft,
    ) -> Result<SpeechSegment, EngineError> {
        if draft.text.trim().is_empty() {
            return Err(EngineError::Validation(
                "segment text must not be empty".into(),
            ));
        }
        let confidence = draft.confidence.unwrap_or(1.0);
        if !(0.0..=1.0).contains(&confidence) {
            return Err(EngineError::Validation(
                "segment confidence must be within [0.0, 1.0]".into(),
            ));
        }
        let _ = self.require_owned(session_id, owner_id).await?;

        let segment = SpeechSegment {
            id: SegmentId::new(),
            session_id: session_id.clone(),
            text: draft.text,
            speaker: draft.speaker.unwrap_or_else(|| "unknown".into()),
            confidence,
            sequence: draft.sequence.unwrap_or(0),
            timestamp: draft.timestamp.unwrap_or_else(Utc::now),
        };
        self.store.save_segment(&segment).await?;

        self.emitter.emit(ScribeEvent::SegmentReceived {
            base: BaseEvent::now(session_id.as_str()),
            id: segment.id.to_string(),
            text: segment.text.clone(),
            speaker: segment.speaker.clone(),
            confidence: segment.confidence,
            sequence: segment.sequence,
        });

        self.queue.enqueue(segment.clone())?;
        Ok(segment)
    }

    /// Delete a session and everything it owns.
    pub async fn delete_session(
        &self,
        owner_id: &str,
        session_id: &SessionId,
    ) -> Result<(), EngineError> {
        let _ = self.require_owned(session_id, owner_id).await?;
        let _ = self.registry.remove_session(session_id);
        self.evict_snapshot(session_id).await;
        self.store.delete_session(session_id).await?;
        info!(session_id = %session_id, "session deleted");
        Ok(())
    }

    /// Full history of a session: segments, documents, actions.
    pub async fn history(
        &self,
        owner_id: &str,
        session_id: &SessionId,
    ) -> Result<SessionHistory, EngineError> {
        let session = self.require_owned(session_id, owner_id).await?;
        Ok(SessionHistory {
            segments: self.store.segments_for(session_id).await?,
            documents: self.store.documents_for(session_id).await?,
            actions: self.store.actions_for(session_id).await?,
            session,
        })
    }

    /// The caller's sessions, newest first, paged.
    pub async fn user_sessions(
        &self,
        owner_id: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Session>, EngineError> {
        Ok(self.store.sessions_for_owner(owner_id, skip, take).await?)
    }

    /// The cached ephemeral snapshot for a session, if any instance wrote
    /// one recently. Cache backend failures read as a miss.
    pub async fn snapshot(&self, session_id: &SessionId) -> Option<SessionSnapshot> {
        match self.cache.get(&snapshot_key(session_id)).await {
            Ok(Some(value)) => match SessionSnapshot::from_value(value) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "malformed session snapshot in cache");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn require_owned(
        &self,
        session_id: &SessionId,
        owner_id: &str,
    ) -> Result<Session, EngineError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        self.check_owner(&session, owner_id)?;
        Ok(session)
    }

    fn check_owner(&self, session: &Session, owner_id: &str) -> Result<(), EngineError> {
        if session.owner_id == owner_id {
            Ok(())
        } else {
            Err(EngineError::Authorization(format!(
                "session {} is not owned by the caller",
                session.id
            )))
        }
    }

    /// Write the session's ephemeral snapshot. Cache failures are
    /// tolerated: the cache is only eventually consistent with the
    /// registry anyway.
    async fn write_snapshot(&self, session: &Session, meta: Option<Value>) {
        let snapshot = SessionSnapshot {
            session_id: session.id.clone(),
            owner_id: session.owner_id.clone(),
            meta,
            connections: self
                .registry
                .connections_for(&session.id)
                .into_iter()
                .map(ConnectionId::into_inner)
                .collect(),
            updated_at: Utc::now(),
        };
        let value = match snapshot.to_value() {
            Ok(value) => value,
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "failed to serialize session snapshot");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .set(&snapshot_key(&session.id), value, self.cache_ttl)
            .await
        {
            warn!(session_id = %session.id, error = %e, "cache write failed");
        }
    }

    /// Rewrite the snapshot's connection list after a partial disconnect.
    async fn refresh_snapshot_connections(&self, session_id: &SessionId) {
        if let Some(mut snapshot) = self.snapshot(session_id).await {
            snapshot.connections = self
                .registry
                .connections_for(session_id)
                .into_iter()
                .map(ConnectionId::into_inner)
                .collect();
            snapshot.updated_at = Utc::now();
            if let Ok(value) = snapshot.to_value() {
                if let Err(e) = self
                    .cache
                    .set(&snapshot_key(session_id), value, self.cache_ttl)
                    .await
                {
                    warn!(session_id = %session_id, error = %e, "cache write failed");
                }
            }
        }
    }

    async fn evict_snapshot(&self, session_id: &SessionId) {
        if let Err(e) = self.cache.delete(&snapshot_key(session_id)).await {
            warn!(session_id = %session_id, error = %e, "cache eviction failed");
        }
    }
}
