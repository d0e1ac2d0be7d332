//! Real-time notification fan-out.
//!
//! - [`ConnectionRegistry`] - users connected to this instance
//! - [`ConnectionLifecycle`] - keeps the registry and presence directory in step
//! - [`NotificationRouter`] - local-first delivery, one envelope per remote instance
//! - [`ChannelEventNotifier`] - message events → channel member pushes
//! - [`BackgroundNotifier`] - detaches fan-out from the triggering request

mod background;
mod channel_events;
mod connection_registry;
mod lifecycle;
mod router;

pub use background::BackgroundNotifier;
pub use channel_events::ChannelEventNotifier;
pub use connection_registry::ConnectionRegistry;
pub use lifecycle::ConnectionLifecycle;
pub use router::{FanOutReport, NotificationRouter};
