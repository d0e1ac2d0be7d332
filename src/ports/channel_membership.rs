//! ChannelMembershipReader port - who belongs to a channel.
//!
//! Channel persistence lives outside this service; notification adapters
//! only need the member list to build a recipient set.

use async_trait::async_trait;

use crate::domain::foundation::{ChannelId, DomainError, UserId};

/// Port for resolving channel membership.
#[async_trait]
pub trait ChannelMembershipReader: Send + Sync {
    /// All member ids of a channel. Unknown channels yield an empty list.
    async fn get_member_ids(&self, channel_id: &ChannelId) -> Result<Vec<UserId>, DomainError>;
}
