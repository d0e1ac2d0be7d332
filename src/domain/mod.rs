//! Domain layer containing business types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, events, errors)
//! - `messaging` - Message views, message events and notification values

pub mod foundation;
pub mod messaging;
