//! Simulated multi-instance cluster built from in-memory adapters.
//!
//! Every node has its own connection registry, router and lifecycle; all
//! nodes share one presence directory and one pub/sub hub, exactly like a
//! fleet sharing one Redis.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use messenger_fanout::adapters::{InMemoryNotificationBridge, InMemoryPresenceDirectory, QueuedConnection};
use messenger_fanout::application::notifications::{ConnectionLifecycle, ConnectionRegistry, NotificationRouter};
use messenger_fanout::domain::foundation::UserId;
use messenger_fanout::ports::{ConnectionHandle, ConnectionId, InstanceId};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);
pub const QUIET_PERIOD: Duration = Duration::from_millis(100);

pub struct Cluster {
    pub presence: Arc<InMemoryPresenceDirectory>,
    pub bridge: Arc<InMemoryNotificationBridge>,
}

pub struct Node {
    pub instance_id: InstanceId,
    pub registry: Arc<ConnectionRegistry>,
    pub router: Arc<NotificationRouter>,
    pub lifecycle: ConnectionLifecycle,
}

/// A user's socket as seen by a test: its id plus the frames it receives.
pub struct Client {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub frames: mpsc::Receiver<String>,
}

impl Cluster {
    pub fn new() -> Self {
        Self {
            presence: Arc::new(InMemoryPresenceDirectory::new()),
            bridge: Arc::new(InMemoryNotificationBridge::new()),
        }
    }

    /// Start a node and subscribe it to its own topic.
    pub async fn node(&self, name: &str) -> Node {
        let instance_id = InstanceId::new(name);
        let registry = Arc::new(ConnectionRegistry::new());
        let router = Arc::new(NotificationRouter::new(
            instance_id.clone(),
            registry.clone(),
            self.presence.clone(),
            self.bridge.clone(),
        ));
        router.listen().await.unwrap();
        let lifecycle = ConnectionLifecycle::new(instance_id.clone(), registry.clone(), self.presence.clone());

        Node {
            instance_id,
            registry,
            router,
            lifecycle,
        }
    }
}

impl Node {
    pub async fn connect(&self, user_id: UserId) -> Client {
        let (connection, frames) = QueuedConnection::new(32);
        let connection_id = connection.connection_id();
        self.lifecycle.add_connection(user_id, Arc::new(connection)).await;
        Client {
            user_id,
            connection_id,
            frames,
        }
    }

    pub async fn disconnect(&self, client: &Client) -> bool {
        self.lifecycle.remove_connection(&client.user_id, client.connection_id).await
    }
}

impl Client {
    /// Next frame, or `None` if nothing arrives in time.
    pub async fn next_frame(&mut self) -> Option<String> {
        tokio::time::timeout(RECV_TIMEOUT, self.frames.recv()).await.ok().flatten()
    }

    /// True if no frame arrives during a short quiet period.
    pub async fn stays_quiet(&mut self) -> bool {
        !matches!(
            tokio::time::timeout(QUIET_PERIOD, self.frames.recv()).await,
            Ok(Some(_))
        )
    }
}
