//! WebSocket control frames.
//!
//! Notification payloads are written to the socket verbatim; only the
//! connection's own control traffic uses these types.
//! - Server → Client: connected, pong, error
//! - Client → Server: ping

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{ConnectionId, InstanceId};

// ============================================
// Server → Client Messages
// ============================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection accepted and registered.
    Connected(ConnectedMessage),

    /// Error occurred.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

impl ServerMessage {
    pub fn connected(user_id: UserId, connection_id: ConnectionId, instance_id: &InstanceId) -> Self {
        ServerMessage::Connected(ConnectedMessage {
            user_id: user_id.to_string(),
            connection_id: connection_id.to_string(),
            instance_id: instance_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn pong() -> Self {
        ServerMessage::Pong(PongMessage {
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.into(),
            message: message.into(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    /// Render as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectedMessage {
    pub user_id: String,
    pub connection_id: String,
    pub instance_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

// ============================================
// Client → Server Messages
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn connected_frame_is_tagged() {
        let frame = ServerMessage::connected(UserId::new(), ConnectionId::new(), &InstanceId::new("node-a:8080"))
            .to_frame()
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(value["type"], "connected");
        assert_eq!(value["instance_id"], "node-a:8080");
    }

    #[test]
    fn pong_frame_is_tagged() {
        let value: Value = serde_json::from_str(&ServerMessage::pong().to_frame().unwrap()).unwrap();
        assert_eq!(value["type"], "pong");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn error_frame_carries_code() {
        let frame = ServerMessage::error("UNSUPPORTED_MESSAGE", "unknown").to_frame().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "UNSUPPORTED_MESSAGE");
    }

    #[test]
    fn ping_is_parsed() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }
}
