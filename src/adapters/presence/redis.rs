//! Redis-backed presence directory for multi-instance deployments.
//!
//! Each entry is a plain string key `presence:<user_id>` holding the owning
//! instance id, written with `SET .. EX <ttl>`. Conditional operations run
//! as Lua scripts so the compare and the write happen atomically on the
//! server.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Script};

use crate::domain::foundation::UserId;
use crate::ports::{InstanceId, PresenceDirectory, PresenceError};

const KEY_PREFIX: &str = "presence:";

/// DEL the key only if it still holds ARGV[1].
const REMOVE_IF_OWNER: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// Re-arm the TTL if the key is missing or still holds ARGV[1].
const REFRESH_IF_OWNER: &str = r#"
local current = redis.call('GET', KEYS[1])
if current == false or current == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
    return 1
end
return 0
"#;

/// Presence directory stored in Redis with per-entry TTL.
///
/// Every command is bounded by `command_timeout`; a slow or unreachable
/// Redis surfaces as [`PresenceError::Unavailable`] instead of stalling a
/// fan-out.
#[derive(Clone)]
pub struct RedisPresenceDirectory {
    conn: MultiplexedConnection,
    ttl_secs: u64,
    command_timeout: Duration,
    remove_if_owner: Script,
    refresh_if_owner: Script,
}

impl RedisPresenceDirectory {
    pub fn new(conn: MultiplexedConnection, ttl_secs: u64, command_timeout: Duration) -> Self {
        Self {
            conn,
            ttl_secs,
            command_timeout,
            remove_if_owner: Script::new(REMOVE_IF_OWNER),
            refresh_if_owner: Script::new(REFRESH_IF_OWNER),
        }
    }

    fn key(user_id: &UserId) -> String {
        format!("{}{}", KEY_PREFIX, user_id)
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, PresenceError>
    where
        F: std::future::Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, op).await {
            Ok(result) => result.map_err(|e: redis::RedisError| PresenceError::Unavailable(e.to_string())),
            Err(_) => Err(PresenceError::Unavailable(format!(
                "command timed out after {:?}",
                self.command_timeout
            ))),
        }
    }
}

#[async_trait]
impl PresenceDirectory for RedisPresenceDirectory {
    async fn set_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<(), PresenceError> {
        let mut conn = self.conn.clone();
        let key = Self::key(user_id);

        self.bounded(
            redis::cmd("SET")
                .arg(&key)
                .arg(instance_id.as_str())
                .arg("EX")
                .arg(self.ttl_secs)
                .query_async::<_, ()>(&mut conn),
        )
        .await
    }

    async fn remove_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<bool, PresenceError> {
        let mut conn = self.conn.clone();
        let key = Self::key(user_id);

        let deleted: i64 = self
            .bounded(
                self.remove_if_owner
                    .key(&key)
                    .arg(instance_id.as_str())
                    .invoke_async(&mut conn),
            )
            .await?;

        Ok(deleted > 0)
    }

    async fn get_owner(&self, user_id: &UserId) -> Result<Option<InstanceId>, PresenceError> {
        let mut conn = self.conn.clone();
        let key = Self::key(user_id);

        let owner: Option<String> = self.bounded(conn.get(&key)).await?;
        Ok(owner.map(InstanceId::from))
    }

    async fn get_owners(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, InstanceId>, PresenceError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut conn = self.conn.clone();
        let keys: Vec<String> = user_ids.iter().map(Self::key).collect();

        let values: Vec<Option<String>> = self
            .bounded(redis::cmd("MGET").arg(&keys).query_async(&mut conn))
            .await?;

        if values.len() != user_ids.len() {
            return Err(PresenceError::Corrupt(format!(
                "MGET returned {} values for {} keys",
                values.len(),
                user_ids.len()
            )));
        }

        Ok(user_ids
            .iter()
            .zip(values)
            .filter_map(|(user_id, owner)| owner.map(|owner| (*user_id, InstanceId::from(owner))))
            .collect())
    }

    async fn refresh_owner(&self, user_id: &UserId, instance_id: &InstanceId) -> Result<bool, PresenceError> {
        let mut conn = self.conn.clone();
        let key = Self::key(user_id);

        let refreshed: i64 = self
            .bounded(
                self.refresh_if_owner
                    .key(&key)
                    .arg(instance_id.as_str())
                    .arg(self.ttl_secs)
                    .invoke_async(&mut conn),
            )
            .await?;

        Ok(refreshed == 1)
    }
}

impl std::fmt::Debug for RedisPresenceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPresenceDirectory")
            .field("ttl_secs", &self.ttl_secs)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}
