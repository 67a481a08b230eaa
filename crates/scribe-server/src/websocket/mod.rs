//! WebSocket gateway: connections, broadcast, dispatch, event bridging.

pub mod broadcast;
pub mod connection;
pub mod event_bridge;
pub mod handler;
pub mod session;
