//! NotificationBridge port - cross-process pub/sub between server instances.
//!
//! Every instance subscribes once, at startup, to the topic derived from its
//! own [`InstanceId`](super::InstanceId). Other instances publish encoded
//! [`NotificationEnvelope`](crate::domain::messaging::NotificationEnvelope)s
//! to that topic when they need to reach users connected there.

use std::sync::Arc;

use async_trait::async_trait;

/// Errors raised by bridge implementations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Publishing failed. The message is dropped, never retried.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// The subscription could not be established.
    #[error("Subscribe failed: {0}")]
    Subscribe(String),
}

/// Callback invoked for every message received on a subscribed topic.
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    async fn on_envelope(&self, raw: String);

    /// Handler name for logging.
    fn name(&self) -> &'static str;
}

/// Port for the cross-process broadcast channel.
#[async_trait]
pub trait NotificationBridge: Send + Sync {
    /// Fire-and-forget broadcast to a named topic.
    ///
    /// No acknowledgement is returned; success only means the shared store
    /// accepted the message.
    async fn publish(&self, topic: &str, envelope: &str) -> Result<(), BridgeError>;

    /// Route every message on `topic` to `handler` for the life of the process.
    ///
    /// The handler runs on a dedicated listener task; this call returns once
    /// the subscription is in place.
    async fn subscribe(&self, topic: &str, handler: Arc<dyn EnvelopeHandler>) -> Result<(), BridgeError>;
}
