//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events
//! - `EventSubscriber` - Port for subscribing to domain events
//! - `EventHandler` - Handler that processes incoming events
//!
//! ## Notification Ports
//!
//! - `ConnectionHandle` - A live client transport owned by this instance
//! - `PresenceDirectory` - Shared user → owning instance map
//! - `NotificationBridge` - Cross-instance pub/sub
//! - `Notifier` - Fan-out entry point used by event adapters
//! - `ChannelMembershipReader` - Channel member lookup

mod channel_membership;
mod connection_handle;
mod event_publisher;
mod event_subscriber;
mod notification_bridge;
mod notifier;
mod presence_directory;

pub use channel_membership::ChannelMembershipReader;
pub use connection_handle::{ConnectionHandle, ConnectionId, DeliveryError};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventHandler, EventSubscriber};
pub use notification_bridge::{BridgeError, EnvelopeHandler, NotificationBridge};
pub use notifier::Notifier;
pub use presence_directory::{InstanceId, PresenceDirectory, PresenceError};
