//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `presence` - presence directory (Redis, in-memory)
//! - `bridge` - cross-instance pub/sub (Redis, in-memory)
//! - `membership` - channel membership (PostgreSQL, in-memory)
//! - `events` - in-process event bus
//! - `websocket` - client transport
//! - `http` - axum router and extractors

pub mod bridge;
pub mod events;
pub mod http;
pub mod membership;
pub mod presence;
pub mod websocket;

pub use bridge::{InMemoryNotificationBridge, RedisNotificationBridge};
pub use events::InMemoryEventBus;
pub use membership::{InMemoryChannelMembership, PostgresChannelMembership};
pub use presence::{InMemoryPresenceDirectory, RedisPresenceDirectory};
pub use websocket::{QueuedConnection, WebSocketState};
