//! PresenceDirectory port - Interface for multi-server presence tracking.
//!
//! In a multi-server deployment, WebSocket connections are tied to specific
//! servers. This port records which server instance currently owns each
//! user's live connection so any instance can route a notification there.
//!
//! ## Use Case
//!
//! 1. User connects to Server A via WebSocket
//! 2. Server A claims the user in the directory (`set_owner`)
//! 3. A message is posted on Server B
//! 4. Server B looks up the user's owner (`get_owner`)
//! 5. Server B publishes the notification to Server A's topic
//! 6. Server A delivers it to the user's WebSocket
//!
//! Entries carry a TTL refreshed by a heartbeat, so the claims of a crashed
//! server expire on their own. Stale entries in between are tolerated.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

/// Prefix for the pub/sub topic every instance listens on.
const NOTIFICATION_TOPIC_PREFIX: &str = "notifications:";

/// Unique identifier for a server instance in a multi-server deployment.
///
/// Format is typically hostname:port or container/pod ID. Stored as the
/// directory value and used to derive the instance's notification topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    /// Create a new instance ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the instance ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pub/sub topic this instance subscribes to.
    pub fn notification_topic(&self) -> String {
        format!("{}{}", NOTIFICATION_TOPIC_PREFIX, self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Errors that can occur in presence directory operations.
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The shared store could not be reached or rejected the command.
    #[error("Presence directory unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be interpreted.
    #[error("Corrupt presence entry: {0}")]
    Corrupt(String),
}

/// Port for tracking which server instance owns each user's connection.
///
/// Implementations must:
/// - Keep at most one entry per user (last claim wins)
/// - Make `remove_owner` and `refresh_owner` conditional on the entry still
///   naming the caller's instance
/// - Expire entries that are not refreshed
#[async_trait]
pub trait PresenceDirectory: Send + Sync {
    /// Claim a user for an instance, overwriting any previous claim.
    ///
    /// Called when a WebSocket connection is established.
    async fn set_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<(), PresenceError>;

    /// Release a user's claim, but only if it still points at `instance_id`.
    ///
    /// If the user has since reconnected to another instance, that newer
    /// claim is left untouched. Returns whether an entry was deleted.
    async fn remove_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<bool, PresenceError>;

    /// Look up the instance owning a user's connection.
    ///
    /// Returns `None` if the user is offline or the entry has expired.
    async fn get_owner(&self, user_id: &UserId) -> Result<Option<InstanceId>, PresenceError>;

    /// Batched lookup. Users without an entry are absent from the result.
    async fn get_owners(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, InstanceId>, PresenceError> {
        let mut owners = HashMap::with_capacity(user_ids.len());
        for user_id in user_ids {
            if let Some(owner) = self.get_owner(user_id).await? {
                owners.insert(*user_id, owner);
            }
        }
        Ok(owners)
    }

    /// Heartbeat for a live connection.
    ///
    /// Re-arms the TTL if the entry still names `instance_id`, or re-claims
    /// it if it has expired. Never overwrites another instance's claim.
    /// Returns whether this instance holds the entry afterwards.
    async fn refresh_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<bool, PresenceError>;
}
