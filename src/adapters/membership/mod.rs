//! Channel membership adapters.
//!
//! - `PostgresChannelMembership` - reads `channel_members` via sqlx
//! - `InMemoryChannelMembership` - map-backed reader for tests and local runs

mod in_memory;
mod postgres;

pub use in_memory::InMemoryChannelMembership;
pub use postgres::PostgresChannelMembership;
