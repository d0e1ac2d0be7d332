//! ChannelEventNotifier - turns channel message events into pushes.
//!
//! One handler type serves every [`NotificationKind`]; the kind only decides
//! which domain event it listens to and the `type` of the pushed frame.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::foundation::{ChannelId, DomainError, ErrorCode, EventEnvelope};
use crate::domain::messaging::{MessageView, NotificationKind, NotificationPayload};
use crate::ports::{ChannelMembershipReader, EventHandler, EventSubscriber, Notifier};

/// Fields shared by `message.created.v1` and `message.updated.v1` payloads.
#[derive(Debug, Deserialize)]
struct ChannelMessageEvent {
    channel_id: ChannelId,
    message: MessageView,
}

/// Pushes a channel message event to every member of the channel.
///
/// The sender is a member too and receives the push like everyone else.
/// Membership lookup failures are logged and the push is skipped; the
/// action that produced the event has already succeeded and must not fail
/// because of it.
pub struct ChannelEventNotifier {
    kind: NotificationKind,
    members: Arc<dyn ChannelMembershipReader>,
    notifier: Arc<dyn Notifier>,
}

impl ChannelEventNotifier {
    pub fn new(
        kind: NotificationKind,
        members: Arc<dyn ChannelMembershipReader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            kind,
            members,
            notifier,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Subscribe one notifier per kind to its source event type.
    pub fn register_all(
        members: Arc<dyn ChannelMembershipReader>,
        notifier: Arc<dyn Notifier>,
        subscriber: &dyn EventSubscriber,
    ) {
        for kind in NotificationKind::ALL {
            let handler = Arc::new(Self::new(kind, members.clone(), notifier.clone()));
            subscriber.subscribe(kind.source_event_type(), handler);
        }
    }
}

#[async_trait]
impl EventHandler for ChannelEventNotifier {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let data: ChannelMessageEvent = event
            .payload_as()
            .map_err(|e| DomainError::new(ErrorCode::ValidationFailed, e.to_string()))?;

        let payload = NotificationPayload::for_event(self.kind, &data.message)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        let recipients = match self.members.get_member_ids(&data.channel_id).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::warn!(
                    kind = %self.kind,
                    channel_id = %data.channel_id,
                    error = %e,
                    "Skipping notification, channel membership unavailable"
                );
                return Ok(());
            }
        };

        tracing::debug!(
            kind = %self.kind,
            channel_id = %data.channel_id,
            message_id = %data.message.id,
            recipients = recipients.len(),
            "Notifying channel members"
        );

        self.notifier.notify(recipients, payload).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.kind {
            NotificationKind::NewMessage => "NewMessageNotifier",
            NotificationKind::MessageUpdated => "MessageUpdatedNotifier",
        }
    }
}
