//! Segment intake handler.

use async_trait::async_trait;
use scribe_core::SessionId;
use scribe_engine::sessions::SegmentDraft;
use serde_json::{Value, json};
use tracing::instrument;

use crate::context::{Caller, RpcContext};
use crate::errors::RpcError;
use crate::handlers::require_string_param;
use crate::registry::MethodHandler;

/// Persist a segment, broadcast the received event, and enqueue the
/// detached orchestration pass. Returns as soon as the segment is queued.
pub struct ProcessSegmentHandler;

#[async_trait]
impl MethodHandler for ProcessSegmentHandler {
    #[instrument(skip_all, fields(method = "segment.process"))]
    async fn handle(
        &self,
        params: Option<Value>,
        caller: &Caller,
        ctx: &RpcContext,
    ) -> Result<Value, RpcError> {
        let session_id = SessionId::from_string(require_string_param(params.as_ref(), "sessionId")?);
        let draft_value = params
            .as_ref()
            .and_then(|p| p.get("segment"))
            .cloned()
            .ok_or_else(|| RpcError::InvalidParams {
                message: "Missing required parameter 'segment'".into(),
            })?;
        let draft: SegmentDraft =
            serde_json::from_value(draft_value).map_err(|e| RpcError::InvalidParams {
                message: format!("Invalid segment payload: {e}"),
            })?;

        let segment = ctx
            .sessions
            .process_segment(&caller.user_id, &session_id, draft)
            .await?;

        Ok(json!({
            "segmentId": segment.id,
            "sessionId": segment.session_id,
            "sequence": segment.sequence,
            "queued": true,
        }))
    }
}
