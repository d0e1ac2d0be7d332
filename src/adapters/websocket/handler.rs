//! WebSocket upgrade handler for notification connections.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Authenticate via the gateway-forwarded user id
//! 2. Upgrade to WebSocket
//! 3. Register the connection and claim presence
//! 4. Drain the outbound queue, answer pings, refresh presence
//! 5. Release the connection on disconnect

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        FromRef, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::adapters::http::middleware::RequireUser;
use crate::application::notifications::ConnectionLifecycle;
use crate::domain::foundation::UserId;
use crate::ports::ConnectionHandle;

use super::{
    connection::QueuedConnection,
    messages::{ClientMessage, ServerMessage},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub lifecycle: Arc<ConnectionLifecycle>,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
    /// Period of the presence heartbeat.
    pub heartbeat_interval: Duration,
}

impl WebSocketState {
    pub fn new(lifecycle: Arc<ConnectionLifecycle>, outbound_buffer: usize, heartbeat_interval: Duration) -> Self {
        Self {
            lifecycle,
            outbound_buffer,
            heartbeat_interval,
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(
    RequireUser(user_id): RequireUser,
    State(state): State<WebSocketState>,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::debug!(user_id = %user_id, "Upgrading notification connection");
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Push a control frame onto the connection's outbound queue.
fn push_control(connection: &QueuedConnection, message: &ServerMessage) {
    match message.to_frame() {
        Ok(frame) => {
            if let Err(e) = connection.push(frame) {
                tracing::debug!(connection_id = %connection.connection_id(), error = %e, "Control frame dropped");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode control frame"),
    }
}

/// Runs for the lifetime of one socket.
async fn handle_socket(socket: WebSocket, user_id: UserId, state: WebSocketState) {
    let (mut sink, mut stream) = socket.split();

    let (connection, mut outbound) = QueuedConnection::new(state.outbound_buffer);
    let connection_id = connection.connection_id();

    state
        .lifecycle
        .add_connection(user_id, Arc::new(connection.clone()))
        .await;
    push_control(
        &connection,
        &ServerMessage::connected(user_id, connection_id, state.lifecycle.instance_id()),
    );

    // Writer: drain the outbound queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if let Err(e) = sink.send(Message::Text(frame)).await {
                tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader: answer pings until the client goes away
    let control = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => push_control(&control, &ServerMessage::pong()),
                    Err(_) => push_control(
                        &control,
                        &ServerMessage::error("UNSUPPORTED_MESSAGE", "Only ping messages are accepted"),
                    ),
                },
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %control.connection_id(), "Client sent close frame");
                    break;
                }
                // Protocol ping/pong is answered by axum; binary frames are ignored
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(connection_id = %control.connection_id(), "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    let lifecycle = state.lifecycle.clone();
    let heartbeat_interval = state.heartbeat_interval;
    let heartbeat_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            lifecycle.refresh(&user_id).await;
        }
    });

    let writer_finished = tokio::select! {
        _ = &mut send_task => true,
        _ = &mut recv_task => false,
    };
    heartbeat_task.abort();
    if writer_finished {
        recv_task.abort();
        let _ = recv_task.await;
    } else {
        send_task.abort();
        let _ = send_task.await;
    }
    let _ = heartbeat_task.await;

    // Socket halves are released; close the queue before giving up presence
    drop(connection);
    state.lifecycle.remove_connection(&user_id, connection_id).await;
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router<S>() -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
    WebSocketState: FromRef<S>,
{
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
