//! # scribe-rpc
//!
//! The inbound operation surface for realtime clients: JSON wire types,
//! machine-readable error codes, an async method registry with per-handler
//! timeouts, and the handlers for every session/segment operation. The
//! gateway injects the caller's identity ([`context::Caller`]) into every
//! dispatch alongside the shared DI context ([`context::RpcContext`]).

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod types;

pub use context::{Caller, RpcContext};
pub use errors::RpcError;
pub use registry::{MethodHandler, MethodRegistry};
pub use types::{RpcEvent, RpcRequest, RpcResponse};
