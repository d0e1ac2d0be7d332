//! Client-facing view of a chat message.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{ChannelId, MessageId, Timestamp, UserId};

/// File attached to a message, as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    pub id: Uuid,
    pub file_name: String,
    pub url: String,
}

/// Public projection of a message. This is what recipients receive in a
/// push notification; it never contains storage-internal fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub sender_id: UserId,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    #[serde(default)]
    pub attachments: Vec<AttachmentView>,
    pub sent_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let view = MessageView {
            id: MessageId::new(),
            channel_id: ChannelId::new(),
            sender_id: UserId::new(),
            text: "hello".to_string(),
            reply_to: None,
            attachments: vec![],
            sent_at: Timestamp::now(),
            updated_at: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("channelId").is_some());
        assert!(json.get("senderId").is_some());
        assert!(json.get("replyTo").is_none());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = serde_json::json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "channelId": "550e8400-e29b-41d4-a716-446655440001",
            "senderId": "550e8400-e29b-41d4-a716-446655440002",
            "text": "hi",
            "sentAt": "2024-03-01T12:00:00Z"
        });

        let view: MessageView = serde_json::from_value(json).unwrap();
        assert!(view.attachments.is_empty());
        assert!(view.reply_to.is_none());
    }
}
