//! Notification value types shared by the router and the pub/sub bridge.
//!
//! - [`NotificationKind`] - which domain event a push describes
//! - [`NotificationPayload`] - opaque, already-serialized push body
//! - [`NotificationEnvelope`] - recipients + payload, the unit sent between instances

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{UserId, ValidationError};

/// Kinds of chat events that are pushed to channel members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    NewMessage,
    MessageUpdated,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 2] = [NotificationKind::NewMessage, NotificationKind::MessageUpdated];

    /// Logical event name placed in the `type` field of the pushed frame.
    pub fn event_name(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "message.created",
            NotificationKind::MessageUpdated => "message.updated",
        }
    }

    /// Domain event type this kind is derived from.
    pub fn source_event_type(&self) -> &'static str {
        match self {
            NotificationKind::NewMessage => "message.created.v1",
            NotificationKind::MessageUpdated => "message.updated.v1",
        }
    }

    /// Reverse lookup from a domain event type.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.source_event_type() == event_type)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Opaque notification body. The router never looks inside it.
///
/// Cloning is cheap; one payload is shared by every delivery of a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload(Arc<str>);

impl NotificationPayload {
    /// Wraps an already-serialized payload.
    ///
    /// An empty payload is a caller bug and is rejected here, before any
    /// delivery work starts.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("payload"));
        }
        Ok(Self(Arc::from(raw)))
    }

    /// Builds the client-facing frame `{"type": <event name>, "data": <view>}`.
    pub fn for_event<T: Serialize>(kind: NotificationKind, data: &T) -> Result<Self, serde_json::Error> {
        #[derive(Serialize)]
        struct Frame<'a, T> {
            #[serde(rename = "type")]
            kind: &'static str,
            data: &'a T,
        }

        let raw = serde_json::to_string(&Frame {
            kind: kind.event_name(),
            data,
        })?;
        Ok(Self(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors decoding or encoding a [`NotificationEnvelope`].
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Malformed notification envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid notification envelope: {0}")]
    Invalid(#[from] ValidationError),
}

/// Unit transmitted over the pub/sub bridge: the users on the target
/// instance that should receive the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    recipient_ids: Vec<UserId>,
    payload: String,
}

impl NotificationEnvelope {
    pub fn new(recipient_ids: Vec<UserId>, payload: &NotificationPayload) -> Self {
        Self {
            recipient_ids,
            payload: payload.as_str().to_string(),
        }
    }

    pub fn recipient_ids(&self) -> &[UserId] {
        &self.recipient_ids
    }

    pub fn encode(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Splits the envelope into recipients and a validated payload.
    pub fn into_parts(self) -> Result<(Vec<UserId>, NotificationPayload), EnvelopeError> {
        let payload = NotificationPayload::new(self.payload)?;
        Ok((self.recipient_ids, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_is_rejected() {
        assert_eq!(
            NotificationPayload::new(""),
            Err(ValidationError::empty_field("payload"))
        );
    }

    #[test]
    fn for_event_wraps_data_with_type() {
        let payload =
            NotificationPayload::for_event(NotificationKind::MessageUpdated, &json!({"text": "edited"}))
                .unwrap();

        let value: serde_json::Value = serde_json::from_str(payload.as_str()).unwrap();
        assert_eq!(value, json!({"type": "message.updated", "data": {"text": "edited"}}));
    }

    #[test]
    fn kind_resolves_from_event_type() {
        assert_eq!(
            NotificationKind::from_event_type("message.created.v1"),
            Some(NotificationKind::NewMessage)
        );
        assert_eq!(NotificationKind::from_event_type("channel.created.v1"), None);
    }

    #[test]
    fn envelope_uses_camel_case_wire_format() {
        let user = UserId::new();
        let payload = NotificationPayload::new("hello").unwrap();
        let encoded = NotificationEnvelope::new(vec![user], &payload).encode().unwrap();

        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, json!({"recipientIds": [user.to_string()], "payload": "hello"}));
    }

    #[test]
    fn envelope_survives_encode_decode() {
        let users = vec![UserId::new(), UserId::new()];
        let payload = NotificationPayload::new(r#"{"type":"message.created"}"#).unwrap();
        let envelope = NotificationEnvelope::new(users.clone(), &payload);

        let decoded = NotificationEnvelope::decode(&envelope.encode().unwrap()).unwrap();
        let (recipients, decoded_payload) = decoded.into_parts().unwrap();

        assert_eq!(recipients, users);
        assert_eq!(decoded_payload, payload);
    }

    #[test]
    fn garbage_envelope_is_malformed() {
        assert!(matches!(
            NotificationEnvelope::decode("not json"),
            Err(EnvelopeError::Malformed(_))
        ));
    }

    #[test]
    fn envelope_with_empty_payload_is_invalid() {
        let envelope = NotificationEnvelope::decode(r#"{"recipientIds":[],"payload":""}"#).unwrap();
        assert!(matches!(envelope.into_parts(), Err(EnvelopeError::Invalid(_))));
    }
}
