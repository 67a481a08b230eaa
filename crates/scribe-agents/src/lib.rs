//! # scribe-agents
//!
//! Pluggable processing agents.
//!
//! An agent is a capability unit implementing [`AgentHandler`]:
//! `should_activate` (the activation rule over its [`AgentConfig`]) and
//! `process` (artifact generation from a [`SegmentContext`]). Agents live
//! in an explicit [`AgentRegistry`] table keyed by unique name — adding an
//! agent means adding an entry, there is no dynamic discovery.
//!
//! Built-in agents: summary, prescription, follow-up, action-item.

#![deny(unsafe_code)]

pub mod agent;
pub mod builtin;
pub mod config;
pub mod context;
pub mod registry;

pub use agent::{AgentError, AgentHandler};
pub use config::AgentConfigStore;
pub use context::SegmentContext;
pub use registry::AgentRegistry;
