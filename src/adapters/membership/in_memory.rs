//! In-memory channel membership for tests and single-node development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, DomainError, ErrorCode, UserId};
use crate::ports::ChannelMembershipReader;

pub struct InMemoryChannelMembership {
    channels: RwLock<HashMap<ChannelId, Vec<UserId>>>,
    available: AtomicBool,
}

impl InMemoryChannelMembership {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Replace the member list of a channel.
    pub async fn set_members(&self, channel_id: ChannelId, members: Vec<UserId>) {
        self.channels.write().await.insert(channel_id, members);
    }

    pub async fn add_member(&self, channel_id: ChannelId, user_id: UserId) {
        let mut channels = self.channels.write().await;
        let members = channels.entry(channel_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }

    /// Simulate a database outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for InMemoryChannelMembership {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelMembershipReader for InMemoryChannelMembership {
    async fn get_member_ids(&self, channel_id: &ChannelId) -> Result<Vec<UserId>, DomainError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(DomainError::new(ErrorCode::DatabaseError, "Membership store unavailable"));
        }
        Ok(self
            .channels
            .read()
            .await
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }
}
