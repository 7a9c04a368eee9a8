//! `tradepost-events` — mutation-event transport mechanics (no business rules).
//!
//! The primary store is the source of truth; this crate only moves
//! already-committed facts toward the search index. Delivery is
//! **at-least-once**: consumers must apply events idempotently.

pub mod bus;
pub mod envelope;
pub mod in_memory;
pub mod routing;
pub mod testing;

pub use bus::{EventBus, Subscription};
pub use envelope::SyncEnvelope;
pub use in_memory::{InMemoryBusError, InMemoryEventBus};
pub use routing::{RoutingKey, SYNC_EXCHANGE};
