//! Idempotent application of mutation events to the search index.

use thiserror::Error;

use tradepost_catalog::ItemMutation;
use tradepost_events::SyncEnvelope;

use super::index::{IndexDocument, IndexError, SearchIndex};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Converges the index toward the primary store, one event at a time.
///
/// Makes no assumption that events for the same item arrive in commit order:
/// each event is authoritative for its own payload (last delivered wins),
/// which is safe because payloads are full snapshots, not deltas. Applying
/// the same event twice yields the same index state as applying it once.
#[derive(Debug)]
pub struct IndexSynchronizer<I> {
    index: I,
}

impl<I> IndexSynchronizer<I>
where
    I: SearchIndex,
{
    pub fn new(index: I) -> Self {
        Self { index }
    }

    /// Apply one delivered event.
    ///
    /// An `Err` means the event must not be acknowledged — the transport will
    /// redeliver it (bounded by the worker, which dead-letters on exhaustion).
    pub fn apply(&self, envelope: &SyncEnvelope<ItemMutation>) -> Result<(), SyncError> {
        match envelope.payload() {
            ItemMutation::Upserted { snapshot } => {
                self.index.upsert(IndexDocument::from(snapshot.clone()))?;
            }
            ItemMutation::Deleted { item_id } => {
                self.index.delete(*item_id)?;
            }
        }
        Ok(())
    }
}
