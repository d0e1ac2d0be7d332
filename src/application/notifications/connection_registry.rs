//! Local connection registry: user → live transport handle on this instance.
//!
//! The registry is the only owner of local handles. The router reads from it;
//! only the connection lifecycle writes to it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::ports::{ConnectionHandle, ConnectionId};

/// Thread-safe map of the users connected to this process.
///
/// One connection per user; a second connection from the same user
/// replaces the first (last writer wins).
///
/// # Thread Safety
///
/// Uses `RwLock` since lookups during fan-out vastly outnumber
/// connects and disconnects.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Arc<dyn ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the handle for a user, returning the one it displaced.
    pub async fn register(
        &self,
        user_id: UserId,
        handle: Arc<dyn ConnectionHandle>,
    ) -> Option<Arc<dyn ConnectionHandle>> {
        self.connections.write().await.insert(user_id, handle)
    }

    /// Remove a user's handle unconditionally. No-op if absent.
    pub async fn unregister(&self, user_id: &UserId) -> Option<Arc<dyn ConnectionHandle>> {
        self.connections.write().await.remove(user_id)
    }

    /// Remove a user's handle only if it is still `connection_id`.
    ///
    /// Returns `false` when the user has no handle or a newer connection
    /// has replaced it.
    pub async fn unregister_connection(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(user_id) {
            Some(current) if current.connection_id() == connection_id => {
                connections.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn get(&self, user_id: &UserId) -> Option<Arc<dyn ConnectionHandle>> {
        self.connections.read().await.get(user_id).cloned()
    }

    pub async fn contains(&self, user_id: &UserId) -> bool {
        self.connections.read().await.contains_key(user_id)
    }

    /// Number of users connected to this instance.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Snapshot of connected users (for shutdown and diagnostics).
    pub async fn connected_users(&self) -> Vec<UserId> {
        self.connections.read().await.keys().copied().collect()
    }
}
