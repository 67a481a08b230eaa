//! # scribe-core
//!
//! Shared domain model for the scribe pipeline:
//!
//! - Branded ID newtypes (sessions, connections, segments, artifacts)
//! - Speech segments, extraction results, agent output, session lifecycle
//! - [`events::ScribeEvent`] — the domain event bus payload broadcast to
//!   realtime subscribers
//! - [`store::Persistence`] — the persistence port consumed by the engine,
//!   with an in-memory implementation for tests and local runs

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod store;
pub mod types;

pub use ids::{ActionId, ConnectionId, DocumentId, SegmentId, SessionId};
