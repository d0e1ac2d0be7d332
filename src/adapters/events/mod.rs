//! Event bus adapters.
//!
//! - `InMemoryEventBus` - in-process bus between the event ingress route
//!   and the channel notifiers

mod in_memory;

pub use in_memory::InMemoryEventBus;
