//! Application layer - orchestration between the domain and the ports.
//!
//! Everything here depends only on port traits; concrete Redis, Postgres
//! and WebSocket adapters are wired in by the composition root.

pub mod notifications;

pub use notifications::{
    BackgroundNotifier, ChannelEventNotifier, ConnectionLifecycle, ConnectionRegistry,
    FanOutReport, NotificationRouter,
};
