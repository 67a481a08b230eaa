//! Persistence port and in-memory implementation.
//!
//! The storage schema and query layer are external collaborators; the
//! engine consumes only this trait. [`MemoryStore`] backs tests and local
//! runs. Deleting a session cascades to everything it owns (segments,
//! documents, actions, audit records).

use async_trait::async_trait;
use dashmap::DashMap;

use crate::ids::SessionId;
use crate::types::{ActionItem, AuditRecord, GeneratedDocument, Session, SpeechSegment};

/// Errors surfaced by a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence collaborator consumed by the engine and the RPC handlers.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Persist a speech segment.
    async fn save_segment(&self, segment: &SpeechSegment) -> Result<(), StoreError>;

    /// Persist a generated document.
    async fn save_document(&self, document: &GeneratedDocument) -> Result<(), StoreError>;

    /// Persist a generated action item.
    async fn save_action(&self, action: &ActionItem) -> Result<(), StoreError>;

    /// Persist an audit record.
    async fn save_audit_record(&self, record: &AuditRecord) -> Result<(), StoreError>;

    /// Look up a session by id.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Insert or update a session row.
    async fn upsert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Delete a session and everything it owns. Idempotent.
    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError>;

    /// All segments for a session, in sequence order.
    async fn segments_for(&self, id: &SessionId) -> Result<Vec<SpeechSegment>, StoreError>;

    /// All generated documents for a session.
    async fn documents_for(&self, id: &SessionId) -> Result<Vec<GeneratedDocument>, StoreError>;

    /// All generated actions for a session.
    async fn actions_for(&self, id: &SessionId) -> Result<Vec<ActionItem>, StoreError>;

    /// Sessions owned by a user, newest first, paged.
    async fn sessions_for_owner(
        &self,
        owner_id: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Session>, StoreError>;
}

/// In-memory [`Persistence`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<SessionId, Session>,
    segments: DashMap<SessionId, Vec<SpeechSegment>>,
    documents: DashMap<SessionId, Vec<GeneratedDocument>>,
    actions: DashMap<SessionId, Vec<ActionItem>>,
    audits: DashMap<SessionId, Vec<AuditRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Audit records for a session (test/introspection helper, not part of
    /// the port).
    #[must_use]
    pub fn audit_records_for(&self, id: &SessionId) -> Vec<AuditRecord> {
        self.audits.get(id).map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn save_segment(&self, segment: &SpeechSegment) -> Result<(), StoreError> {
        self.segments
            .entry(segment.session_id.clone())
            .or_default()
            .push(segment.clone());
        Ok(())
    }

    async fn save_document(&self, document: &GeneratedDocument) -> Result<(), StoreError> {
        self.documents
            .entry(document.session_id.clone())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    async fn save_action(&self, action: &ActionItem) -> Result<(), StoreError> {
        self.actions
            .entry(action.session_id.clone())
            .or_default()
            .push(action.clone());
        Ok(())
    }

    async fn save_audit_record(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.audits
            .entry(record.session_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    async fn upsert_session(&self, session: &Session) -> Result<(), StoreError> {
        let _ = self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let _ = self.sessions.remove(id);
        let _ = self.segments.remove(id);
        let _ = self.documents.remove(id);
        let _ = self.actions.remove(id);
        let _ = self.audits.remove(id);
        Ok(())
    }

    async fn segments_for(&self, id: &SessionId) -> Result<Vec<SpeechSegment>, StoreError> {
        let mut segments = self.segments.get(id).map(|v| v.clone()).unwrap_or_default();
        segments.sort_by_key(|s| s.sequence);
        Ok(segments)
    }

    async fn documents_for(&self, id: &SessionId) -> Result<Vec<GeneratedDocument>, StoreError> {
        Ok(self.documents.get(id).map(|v| v.clone()).unwrap_or_default())
    }

    async fn actions_for(&self, id: &SessionId) -> Result<Vec<ActionItem>, StoreError> {
        Ok(self.actions.get(id).map(|v| v.clone()).unwrap_or_default())
    }

    async fn sessions_for_owner(
        &self,
        owner_id: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.clone())
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions.into_iter().skip(skip).take(take).collect())
    }
}
