//! In-memory inventory store for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::RwLock;

use tradepost_catalog::{DeductionOutcome, Item};
use tradepost_core::ItemId;

use super::store::{InventoryStore, StoreError};

/// In-memory item storage.
///
/// The conditional decrement takes the write lock, so check-and-decrement is
/// one critical section — linearizable with respect to every other operation
/// on the map. Coarser than per-item locking, but correct, and contention is
/// bounded by the lock hold time (a map lookup and an integer subtraction).
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn read(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        let items = self.items.read().map_err(|_| StoreError::Poisoned)?;
        Ok(items.get(&item_id).cloned())
    }

    fn read_many(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, StoreError> {
        let items = self.items.read().map_err(|_| StoreError::Poisoned)?;
        Ok(item_ids
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }

    fn write(&self, item: Item) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| StoreError::Poisoned)?;
        items.insert(item.id, item);
        Ok(())
    }

    fn delete(&self, item_id: ItemId) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| StoreError::Poisoned)?;
        items.remove(&item_id);
        Ok(())
    }

    fn update(
        &self,
        item_id: ItemId,
        apply: &mut dyn FnMut(&mut Item),
    ) -> Result<Option<Item>, StoreError> {
        let mut items = self.items.write().map_err(|_| StoreError::Poisoned)?;
        let Some(item) = items.get_mut(&item_id) else {
            return Ok(None);
        };
        apply(item);
        Ok(Some(item.clone()))
    }

    fn conditional_decrement(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<DeductionOutcome, StoreError> {
        let mut items = self.items.write().map_err(|_| StoreError::Poisoned)?;
        let Some(item) = items.get_mut(&item_id) else {
            return Ok(DeductionOutcome::NotFound);
        };
        if item.stock < quantity {
            return Ok(DeductionOutcome::InsufficientStock);
        }
        item.stock -= quantity;
        Ok(DeductionOutcome::Applied)
    }

    fn increment(&self, item_id: ItemId, quantity: u32) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| StoreError::Poisoned)?;
        let Some(item) = items.get_mut(&item_id) else {
            return Err(StoreError::MissingItem(item_id));
        };
        item.stock = item.stock.saturating_add(quantity);
        Ok(())
    }
}
