//! Notifier port - the single entry point for pushing a payload to users.

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::messaging::NotificationPayload;

/// Port for best-effort delivery of a notification to a set of users.
///
/// Delivery problems are never reported back: callers (message creation,
/// message edits) must succeed regardless of who actually got the push.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipients: Vec<UserId>, payload: NotificationPayload);
}
