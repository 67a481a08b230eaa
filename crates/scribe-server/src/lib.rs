//! # scribe-server
//!
//! Axum HTTP + `WebSocket` realtime gateway.
//!
//! - `GET /ws` upgrade: one [`websocket::connection::ClientConnection`]
//!   per client, heartbeat, RPC dispatch with caller identity
//! - Session-scoped event fan-out: the
//!   [`websocket::event_bridge::EventBridge`] converts domain events to
//!   wire events and routes them through the
//!   [`websocket::broadcast::BroadcastManager`]
//! - `GET /health` and `GET /metrics` endpoints
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod websocket;
