//! PostgreSQL implementation of ChannelMembershipReader.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ChannelId, DomainError, ErrorCode, UserId};
use crate::ports::ChannelMembershipReader;

/// Reads channel members from the messenger's `channel_members` table.
pub struct PostgresChannelMembership {
    pool: PgPool,
}

impl PostgresChannelMembership {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelMembershipReader for PostgresChannelMembership {
    async fn get_member_ids(&self, channel_id: &ChannelId) -> Result<Vec<UserId>, DomainError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT user_id
            FROM channel_members
            WHERE channel_id = $1
            "#,
        )
        .bind(channel_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load channel members: {}", e),
            )
            .with_detail("channel_id", channel_id.to_string())
        })?;

        Ok(rows.into_iter().map(|(id,)| UserId::from_uuid(id)).collect())
    }
}
