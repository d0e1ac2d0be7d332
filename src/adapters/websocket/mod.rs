//! WebSocket transport for real-time notifications.
//!
//! Every accepted socket becomes a [`QueuedConnection`] registered with the
//! connection lifecycle. The notification router writes payloads onto the
//! connection's queue; a per-socket writer task drains it into the socket.
//!
//! ```text
//! NotificationRouter ──send──► QueuedConnection (bounded mpsc)
//!                                      │
//!                                      ▼
//!                               writer task ──► WebSocket ──► client
//!                                                   │
//!                      reader task ◄── ping / close ┘
//! ```
//!
//! # Components
//!
//! - [`connection`] - queue-backed `ConnectionHandle`
//! - [`messages`] - control frame types
//! - [`handler`] - axum upgrade handler and socket tasks

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::QueuedConnection;
pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use messages::{ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage};
