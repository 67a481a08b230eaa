//! Connection↔session registration maps.

use std::collections::HashSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use scribe_core::{ConnectionId, SessionId};

/// Result of removing a connection from the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    /// The session the connection belonged to.
    pub session_id: SessionId,
    /// Whether this removal drained the session's connection set.
    pub emptied: bool,
}

/// Bidirectional connection↔session mapping.
///
/// Explicitly constructed and dependency-injected: the registry owns no
/// global state. The reverse map's connection-set mutation and its
/// emptiness check happen under one shard entry guard, so "is this the
/// last connection" cannot race a concurrent join. Removal is keyed off
/// the forward map's single `remove`, which makes disconnect handling
/// exactly-once.
#[derive(Default)]
pub struct SessionRegistry {
    forward: DashMap<ConnectionId, SessionId>,
    reverse: DashMap<SessionId, HashSet<ConnectionId>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a session.
    ///
    /// Re-registering a connection moves it: it is first removed from its
    /// previous session, if any.
    pub fn register(&self, connection_id: ConnectionId, session_id: SessionId) {
        if let Some(current) = self.session_of(&connection_id) {
            if current != session_id {
                let _ = self.remove(&connection_id);
            }
        }
        let _ = self
            .reverse
            .entry(session_id.clone())
            .or_default()
            .insert(connection_id.clone());
        let _ = self.forward.insert(connection_id, session_id);
    }

    /// Remove a connection from both maps.
    ///
    /// Returns `None` when the connection was not registered (a repeated
    /// disconnect is a no-op).
    pub fn remove(&self, connection_id: &ConnectionId) -> Option<Removal> {
        let (_, session_id) = self.forward.remove(connection_id)?;
        let mut emptied = false;
        if let Entry::Occupied(mut entry) = self.reverse.entry(session_id.clone()) {
            let _ = entry.get_mut().remove(connection_id);
            if entry.get().is_empty() {
                let _ = entry.remove();
                emptied = true;
            }
        }
        Some(Removal {
            session_id,
            emptied,
        })
    }

    /// Drop a whole session's registrations, returning its connections.
    pub fn remove_session(&self, session_id: &SessionId) -> Vec<ConnectionId> {
        let Some((_, connections)) = self.reverse.remove(session_id) else {
            return Vec::new();
        };
        for connection_id in &connections {
            let _ = self.forward.remove(connection_id);
        }
        connections.into_iter().collect()
    }

    /// The session a connection is registered under.
    #[must_use]
    pub fn session_of(&self, connection_id: &ConnectionId) -> Option<SessionId> {
        self.forward.get(connection_id).map(|s| s.clone())
    }

    /// The connections currently registered under a session.
    #[must_use]
    pub fn connections_for(&self, session_id: &SessionId) -> Vec<ConnectionId> {
        self.reverse
            .get(session_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of live connections in a session.
    #[must_use]
    pub fn connection_count(&self, session_id: &SessionId) -> usize {
        self.reverse.get(session_id).map_or(0, |set| set.len())
    }

    /// Number of sessions with at least one connection.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.reverse.len()
    }

    /// Total registered connections.
    #[must_use]
    pub fn total_connections(&self) -> usize {
        self.forward.len()
    }
}
