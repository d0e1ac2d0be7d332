//! ConnectionHandle port - a live, bidirectional transport to one client.
//!
//! The transport layer (WebSocket today) hands one of these to the
//! connection registry when a handshake succeeds. The router only ever
//! writes to it; closing it is the transport's business.

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::domain::messaging::NotificationPayload;

/// Identifies one accepted transport connection.
///
/// A user that reconnects gets a fresh id, which lets cleanup of the old
/// socket tell itself apart from the connection that replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a single push could not be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The connection is gone (socket closed, writer task ended).
    #[error("Connection closed")]
    Closed,

    /// The outbound queue is full; the push is dropped rather than waited on.
    #[error("Outbound queue full")]
    Backlogged,

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Port for pushing notifications down a live client connection.
///
/// Sends are fire-and-forget: no acknowledgement, no retry, and an
/// implementation must not wait on a slow client.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    /// Id of the underlying transport connection.
    fn connection_id(&self) -> ConnectionId;

    /// Push one payload to the client.
    async fn send(&self, payload: &NotificationPayload) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ConnectionHandle) {}

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn delivery_error_messages() {
        assert_eq!(DeliveryError::Closed.to_string(), "Connection closed");
        assert_eq!(
            DeliveryError::Transport("reset".to_string()).to_string(),
            "Transport error: reset"
        );
    }
}
