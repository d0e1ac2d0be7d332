//! Domain events emitted by the channel aggregate when messages change.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChannelId, EventId, Timestamp};
use crate::domain_event;

use super::MessageView;

/// A message was posted to a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessageCreated {
    pub event_id: EventId,
    pub channel_id: ChannelId,
    pub message: MessageView,
    pub occurred_at: Timestamp,
}

impl NewMessageCreated {
    pub fn new(message: MessageView) -> Self {
        Self {
            event_id: EventId::new(),
            channel_id: message.channel_id,
            message,
            occurred_at: Timestamp::now(),
        }
    }
}

domain_event!(
    NewMessageCreated,
    event_type = "message.created.v1",
    aggregate_id = channel_id,
    aggregate_type = "Channel",
    occurred_at = occurred_at,
    event_id = event_id
);

/// An existing message was edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUpdated {
    pub event_id: EventId,
    pub channel_id: ChannelId,
    pub message: MessageView,
    pub occurred_at: Timestamp,
}

impl MessageUpdated {
    pub fn new(message: MessageView) -> Self {
        Self {
            event_id: EventId::new(),
            channel_id: message.channel_id,
            message,
            occurred_at: Timestamp::now(),
        }
    }
}

domain_event!(
    MessageUpdated,
    event_type = "message.updated.v1",
    aggregate_id = channel_id,
    aggregate_type = "Channel",
    occurred_at = occurred_at,
    event_id = event_id
);
