//! Presence directory adapters.
//!
//! - `RedisPresenceDirectory` - shared directory for multi-instance deployments
//! - `InMemoryPresenceDirectory` - single-process directory for tests and local runs

mod in_memory;
mod redis;

pub use in_memory::InMemoryPresenceDirectory;
pub use self::redis::RedisPresenceDirectory;
