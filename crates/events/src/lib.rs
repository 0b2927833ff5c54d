//! Notification events and the pub/sub plumbing that carries them.
//!
//! The console emits events for every committed change; presentation layers
//! (toasts, activity feeds) subscribe and render them.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
