//! Messenger Fan-out - real-time notification delivery for a horizontally
//! scaled chat backend.
//!
//! Chat events (new message, message edited) are pushed to every online
//! channel member, whichever server instance holds the member's WebSocket.
//! Local recipients are served from the in-process connection registry;
//! remote ones are batched into one envelope per owning instance and sent
//! over Redis pub/sub, with a Redis presence directory recording which
//! instance owns each user.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
