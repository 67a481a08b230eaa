//! Session lifecycle handlers: start, stop, delete.

use async_trait::async_trait;
use scribe_core::SessionId;
use serde_json::{Value, json};
use tracing::instrument;

use crate::context::{Caller, RpcContext};
use crate::errors::RpcError;
use crate::handlers::{optional_string_param, require_string_param};
use crate::registry::MethodHandler;

/// Start (or join) a session. Idempotent per session id.
pub struct StartSessionHandler;

#[async_trait]
impl MethodHandler for StartSessionHandler {
    #[instrument(skip_all, fields(method = "session.start"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let session_id =
            optional_string_param(params.as_ref(), "sessionId").map(SessionId::from_string);
        let meta = params.as_ref().and_then(|p| p.get("meta")).cloned();

        let session = ctx
            .sessions
            .start_session(&caller.connection_id, &caller.user_id, session_id, meta)
            .await?;

        Ok(json!({
            "sessionId": session.id,
            "ownerId": session.owner_id,
            "status": session.status,
            "startedAt": session.started_at.to_rfc3339(),
        }))
    }
}

/// Explicitly stop a session (terminal).
pub struct StopSessionHandler;

#[async_trait]
impl MethodHandler for StopSessionHandler {
    #[instrument(skip_all, fields(method = "session.stop"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let session_id = SessionId::from_string(require_string_param(params.as_ref(), "sessionId")?);

        let session = ctx
            .sessions
            .stop_session(&caller.connection_id, &caller.user_id, &session_id)
            .await?;

        Ok(json!({
            "sessionId": session.id,
            "status": session.status,
            "endedAt": session.ended_at.map(|t| t.to_rfc3339()),
        }))
    }
}

/// Delete a session and everything it owns.
pub struct DeleteSessionHandler;

#[async_trait]
impl MethodHandler for DeleteSessionHandler {
    #[instrument(skip_all, fields(method = "session.delete"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let session_id = SessionId::from_string(require_string_param(params.as_ref(), "sessionId")?);

        ctx.sessions
            .delete_session(&caller.user_id, &session_id)
            .await?;

        Ok(json!({ "sessionId": session_id, "deleted": true }))
    }
}
