//! Notification bridge adapters.
//!
//! - `RedisNotificationBridge` - Redis pub/sub between server instances
//! - `InMemoryNotificationBridge` - shared in-process hub for tests

mod in_memory;
mod redis;

pub use in_memory::{InMemoryNotificationBridge, PublishedEnvelope};
pub use self::redis::RedisNotificationBridge;
