//! RPC error codes and error type.

use scribe_engine::EngineError;

use crate::types::RpcErrorBody;

// ── Error code constants ────────────────────────────────────────────

/// Invalid or missing parameters.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Request payload failed domain validation (e.g. empty segment text).
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Caller does not own the addressed session.
pub const NOT_AUTHORIZED: &str = "NOT_AUTHORIZED";
/// Session does not exist.
pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
/// Generic not-found.
pub const NOT_FOUND: &str = "NOT_FOUND";
/// Segment queue back-pressure limit reached.
pub const PIPELINE_BUSY: &str = "PIPELINE_BUSY";
/// Method not found in the registry.
pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
/// Unexpected internal error.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// RPC error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Required parameter missing or wrong type.
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },

    /// Domain validation failed.
    #[error("{message}")]
    Validation {
        /// Description of what is wrong.
        message: String,
    },

    /// Caller lacks ownership of the addressed resource.
    #[error("{message}")]
    NotAuthorized {
        /// Description.
        message: String,
    },

    /// Requested resource not found.
    #[error("{message}")]
    NotFound {
        /// Specific error code (e.g. `SESSION_NOT_FOUND`).
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// Back-pressure: try again later.
    #[error("{message}")]
    Busy {
        /// Description.
        message: String,
    },

    /// Internal server error.
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl RpcError {
    /// Machine-readable error code for this variant.
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::Validation { .. } => VALIDATION_ERROR,
            Self::NotAuthorized { .. } => NOT_AUTHORIZED,
            Self::NotFound { code, .. } => code,
            Self::Busy { .. } => PIPELINE_BUSY,
            Self::Internal { .. } => INTERNAL_ERROR,
        }
    }

    /// Convert to the wire-format error body.
    pub fn to_error_body(&self) -> RpcErrorBody {
        RpcErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
        }
    }
}

impl From<EngineError> for RpcError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => Self::Validation { message },
            EngineError::Authorization(message) => Self::NotAuthorized { message },
            EngineError::SessionNotFound(id) => Self::NotFound {
                code: SESSION_NOT_FOUND.into(),
                message: format!("session not found: {id}"),
            },
            EngineError::QueueFull => Self::Busy {
                message: "segment queue full, retry shortly".into(),
            },
            EngineError::Extraction(message) | EngineError::Persistence(message) => {
                Self::Internal { message }
            }
        }
    }
}
