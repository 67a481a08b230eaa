//! Event fan-out to connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;

use scribe_core::ConnectionId;
use scribe_rpc::types::RpcEvent;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::ClientConnection;

/// Manages event broadcasting to connected clients.
pub struct BroadcastManager {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl BroadcastManager {
    /// Create a new broadcast manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
    }

    /// Remove a connection by ID.
    pub async fn remove(&self, connection_id: &ConnectionId) {
        let mut conns = self.connections.write().await;
        let _ = conns.remove(connection_id);
    }

    /// Broadcast an event to all connections bound to the given session.
    pub async fn broadcast_to_session(&self, session_id: &str, event: &RpcEvent) {
        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(event_type = event.event_type, error = %e, "failed to serialize event");
                return;
            }
        };
        let conns = self.connections.read().await;
        let mut recipients = 0;
        for conn in conns.values() {
            if conn.session_id().as_deref() == Some(session_id) {
                recipients += 1;
                if !conn.send(json.clone()) {
                    warn!(conn_id = %conn.id, session_id, "failed to send event to client");
                }
            }
        }
        debug!(
            event_type = event.event_type,
            session_id, recipients, "broadcast event to session"
        );
    }

    /// Broadcast an event to all connections.
    pub async fn broadcast_all(&self, event: &RpcEvent) {
        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(event_type = event.event_type, error = %e, "failed to serialize event");
                return;
            }
        };
        let conns = self.connections.read().await;
        debug!(
            event_type = event.event_type,
            recipients = conns.len(),
            "broadcast event to all"
        );
        for conn in conns.values() {
            if !conn.send(json.clone()) {
                warn!(conn_id = %conn.id, "failed to send event to client");
            }
        }
    }

    /// Number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get connections bound to a specific session.
    pub async fn session_connections(&self, session_id: &str) -> Vec<Arc<ClientConnection>> {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|c| c.session_id().as_deref() == Some(session_id))
            .cloned()
            .collect()
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}
