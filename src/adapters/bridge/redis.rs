//! Redis pub/sub notification bridge.
//!
//! Publishing goes through the shared multiplexed connection. Each
//! subscription owns a dedicated pub/sub connection driven by a spawned
//! listener task, which re-subscribes with exponential backoff when the
//! connection drops and exits when the shutdown token fires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{MultiplexedConnection, PubSub};
use redis::AsyncCommands;
use tokio_util::sync::CancellationToken;

use crate::ports::{BridgeError, EnvelopeHandler, NotificationBridge};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Doubling delay between reconnect attempts, capped at [`MAX_BACKOFF`].
#[derive(Debug)]
struct Backoff {
    next: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self { next: INITIAL_BACKOFF }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(MAX_BACKOFF);
        delay
    }

    fn reset(&mut self) {
        self.next = INITIAL_BACKOFF;
    }
}

pub struct RedisNotificationBridge {
    client: redis::Client,
    publisher: MultiplexedConnection,
    publish_timeout: Duration,
    shutdown: CancellationToken,
}

impl RedisNotificationBridge {
    pub fn new(
        client: redis::Client,
        publisher: MultiplexedConnection,
        publish_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            publisher,
            publish_timeout,
            shutdown,
        }
    }
}

async fn open_subscription(client: &redis::Client, topic: &str) -> redis::RedisResult<PubSub> {
    let mut pubsub = client.get_async_connection().await?.into_pubsub();
    pubsub.subscribe(topic).await?;
    Ok(pubsub)
}

/// Drive one subscription until shutdown.
async fn run_listener(
    client: redis::Client,
    topic: String,
    handler: Arc<dyn EnvelopeHandler>,
    mut pubsub: PubSub,
    shutdown: CancellationToken,
) {
    let mut backoff = Backoff::new();

    loop {
        {
            let mut messages = Box::pin(pubsub.on_message());
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        tracing::info!(topic = %topic, handler = handler.name(), "Bridge listener stopped");
                        return;
                    }
                    msg = messages.next() => match msg {
                        Some(msg) => match msg.get_payload::<String>() {
                            Ok(raw) => handler.on_envelope(raw).await,
                            Err(e) => tracing::warn!(topic = %topic, error = %e, "Ignoring non-text pub/sub payload"),
                        },
                        None => break,
                    },
                }
            }
        }

        tracing::warn!(topic = %topic, "Pub/sub connection lost, resubscribing");

        loop {
            let delay = backoff.next_delay();
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = shutdown.cancelled() => return,
            }

            match open_subscription(&client, &topic).await {
                Ok(fresh) => {
                    tracing::info!(topic = %topic, "Pub/sub subscription restored");
                    pubsub = fresh;
                    backoff.reset();
                    break;
                }
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, retry_in = ?backoff.next, "Resubscribe failed");
                }
            }
        }
    }
}

#[async_trait]
impl NotificationBridge for RedisNotificationBridge {
    async fn publish(&self, topic: &str, envelope: &str) -> Result<(), BridgeError> {
        let mut conn = self.publisher.clone();

        match tokio::time::timeout(self.publish_timeout, conn.publish::<_, _, i64>(topic, envelope)).await {
            Ok(Ok(receivers)) => {
                if receivers == 0 {
                    tracing::debug!(topic = %topic, "Envelope published with no listener");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(BridgeError::Publish(e.to_string())),
            Err(_) => Err(BridgeError::Publish(format!(
                "timed out after {:?}",
                self.publish_timeout
            ))),
        }
    }

    async fn subscribe(&self, topic: &str, handler: Arc<dyn EnvelopeHandler>) -> Result<(), BridgeError> {
        let pubsub = open_subscription(&self.client, topic)
            .await
            .map_err(|e| BridgeError::Subscribe(e.to_string()))?;

        tracing::info!(topic = %topic, handler = handler.name(), "Subscribed to notification topic");

        tokio::spawn(run_listener(
            self.client.clone(),
            topic.to_string(),
            handler,
            pubsub,
            self.shutdown.clone(),
        ));

        Ok(())
    }
}

impl std::fmt::Debug for RedisNotificationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisNotificationBridge")
            .field("publish_timeout", &self.publish_timeout)
            .finish_non_exhaustive()
    }
}
