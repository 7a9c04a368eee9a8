//! Best-effort mutation publication (post-commit hook).
//!
//! Runs synchronously in the request path right after the store commit, but
//! its failure is **not** the caller's failure: the primary store is the
//! source of truth, and index-sync unavailability must never block or roll
//! back a committed mutation. A failed publish is logged and swallowed; the
//! index lags until an external backfill reconciles it. `PublishFailed` is
//! terminal from this core's perspective — there is no retry here.

use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use tradepost_catalog::{Item, ItemMutation};
use tradepost_core::ItemId;
use tradepost_events::{EventBus, SyncEnvelope};

/// What became of one publish attempt.
///
/// Returned for operational visibility (metrics, tests); never an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Logged and dropped. The mutation stays committed.
    Failed,
}

/// Hands committed mutations to the transport.
#[derive(Debug)]
pub struct MutationPublisher<B> {
    bus: B,
}

impl<B> MutationPublisher<B>
where
    B: EventBus<SyncEnvelope<ItemMutation>>,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Publish a full snapshot after a create/update/status/stock mutation.
    pub fn item_upserted(&self, snapshot: Item) -> PublishOutcome {
        self.send(ItemMutation::Upserted { snapshot })
    }

    /// Publish a removal after a delete.
    pub fn item_deleted(&self, item_id: ItemId) -> PublishOutcome {
        self.send(ItemMutation::Deleted { item_id })
    }

    fn send(&self, mutation: ItemMutation) -> PublishOutcome {
        let routing = mutation.routing_key();
        let item_id = mutation.item_id();
        let envelope = SyncEnvelope::new(Uuid::now_v7(), routing, Utc::now(), mutation);

        match self.bus.publish(envelope) {
            Ok(()) => PublishOutcome::Published,
            Err(err) => {
                // Keyed by item id so a backfill job can find what lagged.
                error!(
                    item_id = %item_id,
                    exchange = routing.exchange(),
                    routing = %routing,
                    error = ?err,
                    "mutation event publish failed; index will lag for this item"
                );
                PublishOutcome::Failed
            }
        }
    }
}
