//! In-memory notification bridge.
//!
//! A single hub shared by every simulated instance of a test cluster.
//! Each subscription gets its own listener task fed through an unbounded
//! channel, mirroring the detached listener of the Redis bridge.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::ports::{BridgeError, EnvelopeHandler, NotificationBridge};

/// A message accepted by [`InMemoryNotificationBridge::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEnvelope {
    pub topic: String,
    pub envelope: String,
}

#[derive(Default)]
pub struct InMemoryNotificationBridge {
    subscribers: RwLock<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
    published: RwLock<Vec<PublishedEnvelope>>,
    failing: AtomicBool,
}

impl InMemoryNotificationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn published(&self) -> Vec<PublishedEnvelope> {
        self.published.read().await.clone()
    }

    pub async fn published_to(&self, topic: &str) -> Vec<String> {
        self.published
            .read()
            .await
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.envelope.clone())
            .collect()
    }

    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.read().await.get(topic).map_or(0, Vec::len)
    }
}

#[async_trait]
impl NotificationBridge for InMemoryNotificationBridge {
    async fn publish(&self, topic: &str, envelope: &str) -> Result<(), BridgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Publish("simulated outage".to_string()));
        }

        self.published.write().await.push(PublishedEnvelope {
            topic: topic.to_string(),
            envelope: envelope.to_string(),
        });

        if let Some(senders) = self.subscribers.read().await.get(topic) {
            for sender in senders {
                // A finished listener just stops receiving.
                let _ = sender.send(envelope.to_string());
            }
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: Arc<dyn EnvelopeHandler>) -> Result<(), BridgeError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        self.subscribers
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(tx);

        tokio::spawn(async move {
            while let Some(raw) = rx.recv().await {
                handler.on_envelope(raw).await;
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Forward(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl EnvelopeHandler for Forward {
        async fn on_envelope(&self, raw: String) {
            let _ = self.0.send(raw);
        }

        fn name(&self) -> &'static str {
            "Forward"
        }
    }

    #[tokio::test]
    async fn subscriber_receives_messages_for_its_topic_only() {
        let bridge = InMemoryNotificationBridge::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bridge.subscribe("notifications:a", Arc::new(Forward(tx))).await.unwrap();

        bridge.publish("notifications:b", "not for a").await.unwrap();
        bridge.publish("notifications:a", "for a").await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(received.as_deref(), Some("for a"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failing_publish_is_not_recorded() {
        let bridge = InMemoryNotificationBridge::new();
        bridge.set_failing(true);

        assert!(bridge.publish("notifications:a", "{}").await.is_err());
        assert!(bridge.published().await.is_empty());
    }
}
