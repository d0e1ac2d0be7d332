//! Messaging domain - chat message views, message events and the
//! notification types pushed to channel members.

mod events;
mod message;
mod notification;

pub use events::{MessageUpdated, NewMessageCreated};
pub use message::{AttachmentView, MessageView};
pub use notification::{EnvelopeError, NotificationEnvelope, NotificationKind, NotificationPayload};
