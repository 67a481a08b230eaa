//! Read-side handlers: history, session list, cached snapshot.

use async_trait::async_trait;
use scribe_core::SessionId;
use serde_json::{Value, json};
use tracing::instrument;

use crate::context::{Caller, RpcContext};
use crate::errors::{self, RpcError};
use crate::handlers::{optional_usize_param, require_string_param};
use crate::registry::MethodHandler;

/// Default page size for `session.list`.
const DEFAULT_TAKE: usize = 50;
/// Upper bound on one page.
const MAX_TAKE: usize = 200;

/// Full history of one session: segments, documents, actions.
pub struct SessionHistoryHandler;

#[async_trait]
impl MethodHandler for SessionHistoryHandler {
    #[instrument(skip_all, fields(method = "session.history"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let session_id = SessionId::from_string(require_string_param(params.as_ref(), "sessionId")?);

        let history = ctx.sessions.history(&caller.user_id, &session_id).await?;

        Ok(json!({
            "session": history.session,
            "segments": history.segments,
            "documents": history.documents,
            "actions": history.actions,
        }))
    }
}

/// The calling user's sessions, newest first, paged.
pub struct UserSessionsHandler;

#[async_trait]
impl MethodHandler for UserSessionsHandler {
    #[instrument(skip_all, fields(method = "session.list"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let skip = optional_usize_param(params.as_ref(), "skip").unwrap_or(0);
        let take = optional_usize_param(params.as_ref(), "take")
            .unwrap_or(DEFAULT_TAKE)
            .min(MAX_TAKE);

        let sessions = ctx.sessions.user_sessions(&caller.user_id, skip, take).await?;

        Ok(json!({
            "sessions": sessions,
            "skip": skip,
            "take": take,
        }))
    }
}

/// The cached ephemeral snapshot for a session, if one exists.
pub struct SessionSnapshotHandler;

#[async_trait]
impl MethodHandler for SessionSnapshotHandler {
    #[instrument(skip_all, fields(method = "session.snapshot"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let session_id = SessionId::from_string(require_string_param(params.as_ref(), "sessionId")?);

        let Some(snapshot) = ctx.sessions.snapshot(&session_id).await else {
            return Err(RpcError::NotFound {
                code: errors::NOT_FOUND.into(),
                message: format!("no cached snapshot for session {session_id}"),
            });
        };
        if snapshot.owner_id != caller.user_id {
            return Err(RpcError::NotAuthorized {
                message: format!("session {session_id} is not owned by the caller"),
            });
        }

        serde_json::to_value(&snapshot).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::segment::ProcessSegmentHandler;
    use crate::handlers::session::{StartSessionHandler, StopSessionHandler};
    use crate::handlers::test_helpers::{make_test_caller, make_test_context};
    use scribe_core::ConnectionId;
    use scribe_core::store::Persistence;
    use std::time::Duration;

    async fn seed_session(ctx: &RpcContext, caller: &Caller, id: &str) {
        let _ = StartSessionHandler
            .handle(Some(json!({"sessionId": id})), caller, ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn history_returns_segments_and_artifacts() {
        let ctx = make_test_context();
        let caller = make_test_caller();
        seed_session(&ctx, &caller, "s1").await;
        let _ = ProcessSegmentHandler
            .handle(
                Some(json!({"sessionId": "s1", "segment": {"text": "Amoxicillin"}})),
                &caller,
                &ctx,
            )
            .await
            .unwrap();

        // Wait for the detached pass to generate the document.
        for _ in 0..50 {
            let documents = ctx
                .store
                .documents_for(&SessionId::from("s1"))
                .await
                .unwrap();
            if !documents.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let result = SessionHistoryHandler
            .handle(Some(json!({"sessionId": "s1"})), &caller, &ctx)
            .await
            .unwrap();

        assert_eq!(result["session"]["id"], "s1");
        assert_eq!(result["segments"].as_array().unwrap().len(), 1);
        assert_eq!(result["documents"].as_array().unwrap().len(), 1);
        assert!(result["actions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_unknown_session() {
        let ctx = make_test_context();
        let caller = make_test_caller();

        let err = SessionHistoryHandler
            .handle(Some(json!({"sessionId": "ghost"})), &caller, &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn list_pages_own_sessions() {
        let ctx = make_test_context();
        let caller = make_test_caller();
        for i in 0..3 {
            seed_session(&ctx, &caller, &format!("s{i}")).await;
        }

        let result = UserSessionsHandler
            .handle(Some(json!({"skip": 0, "take": 2})), &caller, &ctx)
            .await
            .unwrap();
        assert_eq!(result["sessions"].as_array().unwrap().len(), 2);
        assert_eq!(result["take"], 2);

        // Another user sees nothing.
        let stranger = Caller::new(ConnectionId::from("conn_x"), "stranger");
        let result = UserSessionsHandler
            .handle(None, &stranger, &ctx)
            .await
            .unwrap();
        assert!(result["sessions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_caps_page_size() {
        let ctx = make_test_context();
        let caller = make_test_caller();

        let result = UserSessionsHandler
            .handle(Some(json!({"take": 10_000})), &caller, &ctx)
            .await
            .unwrap();
        assert_eq!(result["take"], MAX_TAKE);
    }

    #[tokio::test]
    async fn snapshot_roundtrip() {
        let ctx = make_test_context();
        let caller = make_test_caller();
        seed_session(&ctx, &caller, "s1").await;

        let result = SessionSnapshotHandler
            .handle(Some(json!({"sessionId": "s1"})), &caller, &ctx)
            .await
            .unwrap();

        assert_eq!(result["sessionId"], "s1");
        assert_eq!(result["ownerId"], "user_test");
        assert_eq!(result["connections"][0], "conn_test");
    }

    #[tokio::test]
    async fn snapshot_missing_after_stop() {
        let ctx = make_test_context();
        let caller = make_test_caller();
        seed_session(&ctx, &caller, "s1").await;
        let _ = StopSessionHandler
            .handle(Some(json!({"sessionId": "s1"})), &caller, &ctx)
            .await
            .unwrap();

        let err = SessionSnapshotHandler
            .handle(Some(json!({"sessionId": "s1"})), &caller, &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn snapshot_of_foreign_session_denied() {
        let ctx = make_test_context();
        let caller = make_test_caller();
        seed_session(&ctx, &caller, "s1").await;

        let stranger = Caller::new(ConnectionId::from("conn_x"), "stranger");
        let err = SessionSnapshotHandler
            .handle(Some(json!({"sessionId": "s1"})), &stranger, &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_AUTHORIZED");
    }
}
