//! Session snapshot payload and key scheme.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use scribe_core::SessionId;

use crate::CacheError;

/// Cache key for a session's snapshot entry.
#[must_use]
pub fn snapshot_key(session_id: &SessionId) -> String {
    format!("scribe:session:{session_id}")
}

/// Ephemeral view of a session shared across server instances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: SessionId,
    /// Owning user.
    pub owner_id: String,
    /// Client-supplied session metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    /// Connection IDs currently registered on this instance.
    pub connections: Vec<String>,
    /// When the snapshot was last written.
    pub updated_at: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Serialize for storage.
    pub fn to_value(&self) -> Result<Value, CacheError> {
        serde_json::to_value(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Deserialize from a stored value.
    pub fn from_value(value: Value) -> Result<Self, CacheError> {
        serde_json::from_value(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}
