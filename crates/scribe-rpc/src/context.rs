//! RPC dependency-injection context and caller identity.

use std::sync::Arc;

use scribe_core::ConnectionId;
use scribe_core::store::Persistence;
use scribe_engine::SessionService;

/// Identity of the connection a request arrived on. The gateway fills
/// this in at dispatch time; handlers never consult global state for it.
#[derive(Clone, Debug)]
pub struct Caller {
    /// The connection the request arrived on.
    pub connection_id: ConnectionId,
    /// The authenticated user behind the connection.
    pub user_id: String,
}

impl Caller {
    /// Create a caller identity.
    #[must_use]
    pub fn new(connection_id: ConnectionId, user_id: impl Into<String>) -> Self {
        Self {
            connection_id,
            user_id: user_id.into(),
        }
    }
}

/// Shared context passed to every RPC handler.
pub struct RpcContext {
    /// Session lifecycle + segment intake service.
    pub sessions: Arc<SessionService>,
    /// Persistence collaborator (for read paths the service doesn't wrap).
    pub store: Arc<dyn Persistence>,
}
