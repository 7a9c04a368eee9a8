use std::sync::Arc;

use thiserror::Error;

use tradepost_catalog::{DeductionOutcome, Item};
use tradepost_core::ItemId;

/// Inventory store operation error.
///
/// These are **infrastructure** failures. Business outcomes of a decrement
/// (insufficient stock, unknown item) are values ([`DeductionOutcome`]), not
/// errors — the engine aggregates them into a batch result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend unreachable or failed mid-operation. The mutation is
    /// not considered committed.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// An internal lock was poisoned by a panicked writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// The record to increment no longer exists. Only reachable from the
    /// compensation path; the engine escalates it as fatal.
    #[error("item {0} missing during increment")]
    MissingItem(ItemId),
}

/// Authoritative, concurrently-shared item storage.
///
/// The conditional decrement is the **sole mutation primitive protecting the
/// stock non-negativity invariant**: it checks and decrements in one
/// linearizable step, so no interleaving of concurrent callers can observe or
/// produce a negative count. Everything else here is plain point persistence.
///
/// Implementations shared across processes must provide that atomicity at the
/// storage level (e.g. a WHERE-guarded `UPDATE`); in-process implementations
/// may use a lock.
pub trait InventoryStore: Send + Sync {
    /// Point read. `Ok(None)` means no record exists (not an error).
    fn read(&self, item_id: ItemId) -> Result<Option<Item>, StoreError>;

    /// Batch point read. Missing identifiers are skipped, not errors.
    fn read_many(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, StoreError>;

    /// Insert or replace an item record.
    fn write(&self, item: Item) -> Result<(), StoreError>;

    /// Remove an item record. Removing a missing record is a no-op.
    fn delete(&self, item_id: ItemId) -> Result<(), StoreError>;

    /// Guarded read-modify-write of a single record.
    ///
    /// `apply` runs against the current record under the store's write guard,
    /// so a concurrent mutation cannot slip between the read and the
    /// write-back (a status transition racing a catalog edit, in particular,
    /// is never reverted). Returns the record after `apply`, or `Ok(None)` if
    /// no record exists.
    fn update(
        &self,
        item_id: ItemId,
        apply: &mut dyn FnMut(&mut Item),
    ) -> Result<Option<Item>, StoreError>;

    /// Atomically check `stock >= quantity` and, if it holds, decrement.
    ///
    /// Must be atomic with respect to all other decrements and reads of the
    /// same item.
    fn conditional_decrement(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<DeductionOutcome, StoreError>;

    /// Plain additive increment (compensation path).
    ///
    /// Not required to be atomic with concurrent decrements beyond what the
    /// backend gives for free: increments commute, and the decrement guard is
    /// what bounds the counter below.
    fn increment(&self, item_id: ItemId, quantity: u32) -> Result<(), StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn read(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        (**self).read(item_id)
    }

    fn read_many(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, StoreError> {
        (**self).read_many(item_ids)
    }

    fn write(&self, item: Item) -> Result<(), StoreError> {
        (**self).write(item)
    }

    fn delete(&self, item_id: ItemId) -> Result<(), StoreError> {
        (**self).delete(item_id)
    }

    fn update(
        &self,
        item_id: ItemId,
        apply: &mut dyn FnMut(&mut Item),
    ) -> Result<Option<Item>, StoreError> {
        (**self).update(item_id, apply)
    }

    fn conditional_decrement(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<DeductionOutcome, StoreError> {
        (**self).conditional_decrement(item_id, quantity)
    }

    fn increment(&self, item_id: ItemId, quantity: u32) -> Result<(), StoreError> {
        (**self).increment(item_id, quantity)
    }
}
