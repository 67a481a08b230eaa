//! # scribe-engine
//!
//! The activation/dispatch engine and the session/connection registry.
//!
//! Per-segment flow: [`extract::EntityIntentExtractor`] produces entities
//! and an intent, [`decision::DecisionEngine`] selects the agents to fire,
//! [`dispatcher::Dispatcher`] runs them concurrently with per-agent failure
//! isolation, and [`pipeline::SegmentPipeline`] ties the pass together with
//! audit records. Detached passes run on the bounded [`queue::SegmentQueue`].
//!
//! Session side: [`registry::SessionRegistry`] holds the
//! connection↔session maps, and [`sessions::SessionService`] drives the
//! lifecycle state machine, cache snapshots, and event emission.

#![deny(unsafe_code)]

pub mod decision;
pub mod dispatcher;
pub mod emitter;
pub mod errors;
pub mod extract;
pub mod pipeline;
pub mod queue;
pub mod registry;
pub mod sessions;

pub use emitter::EventEmitter;
pub use errors::EngineError;
pub use pipeline::SegmentPipeline;
pub use queue::SegmentQueue;
pub use registry::SessionRegistry;
pub use sessions::SessionService;
