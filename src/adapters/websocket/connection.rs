//! Queue-backed connection handle.
//!
//! Each accepted socket gets a bounded outbound queue. The socket's writer
//! task drains the queue; everything else (router, control replies) only
//! pushes onto it, so no caller ever waits on a slow client.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::messaging::NotificationPayload;
use crate::ports::{ConnectionHandle, ConnectionId, DeliveryError};

/// A [`ConnectionHandle`] that enqueues text frames for a writer task.
#[derive(Debug, Clone)]
pub struct QueuedConnection {
    connection_id: ConnectionId,
    outbound: mpsc::Sender<String>,
}

impl QueuedConnection {
    /// Create a handle plus the receiving end its writer task drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let connection = Self {
            connection_id: ConnectionId::new(),
            outbound,
        };
        (connection, rx)
    }

    /// Enqueue a pre-rendered text frame without waiting.
    pub fn push(&self, frame: String) -> Result<(), DeliveryError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Backlogged,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

#[async_trait]
impl ConnectionHandle for QueuedConnection {
    fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), DeliveryError> {
        self.push(payload.as_str().to_string())
    }
}
