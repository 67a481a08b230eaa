//! WebSocket session lifecycle — handles a single connected client from
//! upgrade through disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use scribe_core::{ConnectionId, SessionId};
use scribe_rpc::context::{Caller, RpcContext};
use scribe_rpc::registry::MethodRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::broadcast::BroadcastManager;
use super::connection::ClientConnection;
use super::handler::handle_message;

/// Interval between server-initiated Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a Pong before considering the client dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(90);

/// Run a WebSocket session for a connected client.
///
/// 1. Sends a `connection.established` event with the connection ID
/// 2. Dispatches incoming text frames as RPC requests with the caller's
///    identity attached
/// 3. Binds the connection to its session on a successful `session.start`
///    and unbinds it on `session.stop`
/// 4. Sends periodic Ping frames and disconnects unresponsive clients
/// 5. On disconnect, removes the connection from the broadcast manager
///    and runs the registry's disconnect path exactly once
#[instrument(skip_all, fields(connection_id = %connection_id, user_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    user_id: String,
    registry: Arc<MethodRegistry>,
    ctx: Arc<RpcContext>,
    broadcast: Arc<BroadcastManager>,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(1024);
    let connection = Arc::new(ClientConnection::new(
        connection_id.clone(),
        user_id.clone(),
        send_tx,
    ));
    let caller = Caller::new(connection_id.clone(), user_id);

    let connection_start = std::time::Instant::now();
    info!("client connected");
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);

    broadcast.add(connection.clone()).await;

    // Greet the client with its assigned connection id.
    let connected_msg = serde_json::json!({
        "type": "connection.established",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "data": {
            "connectionId": connection_id.as_str(),
        },
    });
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        let _ = ws_tx.send(Message::Text(json.into())).await;
    }

    // Outbound forwarder with periodic Ping frames.
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(PING_INTERVAL);
        // Skip the immediate first tick.
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > PONG_TIMEOUT
                    {
                        warn!("client unresponsive for {:?}, disconnecting", PONG_TIMEOUT);
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Process incoming messages.
    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_owned()),
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };

        let Some(text) = text else { continue };

        let result = handle_message(&text, &registry, &caller, &ctx).await;

        // Track the session binding for broadcast routing.
        if result.response.success {
            match result.method.as_str() {
                "session.start" => {
                    if let Some(sid) = result
                        .response
                        .result
                        .as_ref()
                        .and_then(|r| r.get("sessionId"))
                        .and_then(|v| v.as_str())
                    {
                        connection.bind_session(SessionId::from(sid));
                        debug!(session_id = sid, "session bound to connection");
                    }
                }
                "session.stop" => {
                    connection.clear_session();
                }
                _ => {}
            }
        }

        if !connection.send(result.response_json) {
            info!("failed to enqueue response (channel full or closed)");
        }
    }

    // Clean up.
    info!("client disconnected");
    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    histogram!("ws_connection_duration_seconds").record(connection_start.elapsed().as_secs_f64());
    outbound.abort();
    broadcast.remove(&connection_id).await;
    ctx.sessions.on_disconnect(&connection_id).await;
}
