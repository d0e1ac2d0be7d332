//! Connection lifecycle - keeps the local registry and the presence
//! directory in step as sockets come and go.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::ports::{ConnectionHandle, ConnectionId, InstanceId, PresenceDirectory};

use super::ConnectionRegistry;

/// Registers and releases connections accepted by this instance.
///
/// Directory failures never reject a connection: the local socket keeps
/// working and remote instances simply cannot reach it until the next
/// heartbeat succeeds.
pub struct ConnectionLifecycle {
    instance_id: InstanceId,
    connections: Arc<ConnectionRegistry>,
    presence: Arc<dyn PresenceDirectory>,
}

impl ConnectionLifecycle {
    pub fn new(
        instance_id: InstanceId,
        connections: Arc<ConnectionRegistry>,
        presence: Arc<dyn PresenceDirectory>,
    ) -> Self {
        Self {
            instance_id,
            connections,
            presence,
        }
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    /// Register a freshly accepted connection, then claim the user's presence.
    pub async fn add_connection(&self, user_id: UserId, handle: Arc<dyn ConnectionHandle>) {
        let connection_id = handle.connection_id();
        if let Some(previous) = self.connections.register(user_id, handle).await {
            tracing::info!(
                user_id = %user_id,
                previous = %previous.connection_id(),
                "Replacing existing connection"
            );
        }

        if let Err(e) = self.presence.set_owner(&user_id, &self.instance_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to claim presence");
        }

        tracing::info!(
            user_id = %user_id,
            connection_id = %connection_id,
            instance_id = %self.instance_id,
            "Connection registered"
        );
    }

    /// Release a connection that has closed.
    ///
    /// Only touches the directory when this exact connection was still the
    /// registered one, and then only deletes an entry naming this instance.
    /// Returns whether the local registration was removed.
    pub async fn remove_connection(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        if !self.connections.unregister_connection(user_id, connection_id).await {
            tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                "Connection already replaced, keeping registration"
            );
            return false;
        }

        match self.presence.remove_owner(user_id, &self.instance_id).await {
            Ok(true) => self.reclaim_if_reconnected(user_id).await,
            Ok(false) => {
                tracing::debug!(user_id = %user_id, "Presence entry owned elsewhere, left untouched")
            }
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Failed to release presence"),
        }

        tracing::info!(user_id = %user_id, connection_id = %connection_id, "Connection removed");
        true
    }

    /// A replacement connection may have registered here and claimed presence
    /// while the delete was in flight; the delete then removed its claim.
    async fn reclaim_if_reconnected(&self, user_id: &UserId) {
        if !self.connections.contains(user_id).await {
            return;
        }

        tracing::debug!(user_id = %user_id, "User reconnected during release, reclaiming presence");
        if let Err(e) = self.presence.set_owner(user_id, &self.instance_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to reclaim presence");
        }
    }

    /// Heartbeat for a live connection. Returns whether this instance still
    /// owns the user's presence entry.
    pub async fn refresh(&self, user_id: &UserId) -> bool {
        match self.presence.refresh_owner(user_id, &self.instance_id).await {
            Ok(owned) => {
                if !owned {
                    tracing::debug!(user_id = %user_id, "Presence claimed by another instance");
                }
                owned
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Presence heartbeat failed");
                false
            }
        }
    }

    /// Release presence for every locally connected user.
    ///
    /// Local registrations are dropped too, which closes the outbound queues
    /// and lets writer tasks finish. Returns the number of users released.
    pub async fn shutdown(&self) -> usize {
        let users = self.connections.connected_users().await;
        for user_id in &users {
            self.connections.unregister(user_id).await;
            if let Err(e) = self.presence.remove_owner(user_id, &self.instance_id).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to release presence on shutdown");
            }
        }

        tracing::info!(released = users.len(), instance_id = %self.instance_id, "Released local presence");
        users.len()
    }
}
