//! Application-level orchestration for catalog mutations.
//!
//! Every mutation follows the same two-step shape:
//!
//! ```text
//! request → inventory store commit → (best-effort) publish → response
//! ```
//!
//! The store commit decides the response; the publish step has its own
//! isolated error channel (a log line) and can never fail the request. Store
//! failures surface synchronously and mean "not committed".

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use tradepost_catalog::{
    BatchResult, DeductionRequest, Item, ItemDraft, ItemMutation, ItemPatch, ItemStatus,
};
use tradepost_core::{DomainError, ItemId};
use tradepost_events::{EventBus, SyncEnvelope};

use crate::deduction::{BatchError, StockDeductionEngine};
use crate::inventory_store::{InventoryStore, StoreError};
use crate::publisher::MutationPublisher;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Deterministic domain rejection (validation, invariant).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The targeted item does not exist.
    #[error("item not found")]
    NotFound,

    /// The inventory store failed; the mutation is not committed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Deduction-engine failure (store trouble mid-batch, or the escalated
    /// compensation failure).
    #[error(transparent)]
    Deduction(#[from] BatchError),
}

/// Catalog mutation surface.
///
/// Generic over the store and bus seams so tests run fully in memory and
/// deployments pick Postgres and a durable broker without touching this code.
#[derive(Debug)]
pub struct CatalogService<S, B> {
    store: S,
    engine: StockDeductionEngine<S>,
    publisher: MutationPublisher<B>,
}

impl<S, B> CatalogService<S, B>
where
    S: InventoryStore + Clone,
    B: EventBus<SyncEnvelope<ItemMutation>>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self {
            engine: StockDeductionEngine::new(store.clone()),
            store,
            publisher: MutationPublisher::new(bus),
        }
    }

    /// Create a new item.
    pub fn create_item(&self, draft: ItemDraft) -> Result<Item, ServiceError> {
        let item = Item::create(ItemId::new(), draft, Utc::now())?;
        self.store.write(item.clone())?;
        // Committed; publish is a post-commit hook and cannot fail the create.
        let _ = self.publisher.item_upserted(item.clone());
        Ok(item)
    }

    /// General catalog edit. Cannot change visibility: the patch type carries
    /// no status, and the edit runs under the store's write guard, so a
    /// concurrent status transition is never read stale and written back.
    pub fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> Result<Item, ServiceError> {
        let now = Utc::now();
        // A rejected patch leaves the record untouched inside the guard; the
        // captured error surfaces after the store call returns.
        let mut rejected = Ok(());
        let item = self
            .store
            .update(item_id, &mut |item| {
                rejected = item.apply_patch(patch.clone(), now);
            })?
            .ok_or(ServiceError::NotFound)?;
        rejected?;
        let _ = self.publisher.item_upserted(item.clone());
        Ok(item)
    }

    /// Dedicated visibility transition — the only path that changes `status`.
    pub fn update_status(
        &self,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<Item, ServiceError> {
        let now = Utc::now();
        let item = self
            .store
            .update(item_id, &mut |item| item.set_status(status, now))?
            .ok_or(ServiceError::NotFound)?;
        let _ = self.publisher.item_upserted(item.clone());
        Ok(item)
    }

    /// Remove an item. Idempotent: deleting a missing item succeeds, and the
    /// delete event is published either way since index deletes are
    /// redundancy-safe.
    pub fn delete_item(&self, item_id: ItemId) -> Result<(), ServiceError> {
        self.store.delete(item_id)?;
        let _ = self.publisher.item_deleted(item_id);
        Ok(())
    }

    pub fn get_item(&self, item_id: ItemId) -> Result<Item, ServiceError> {
        self.store.read(item_id)?.ok_or(ServiceError::NotFound)
    }

    /// Batch point read; unknown identifiers are skipped.
    pub fn get_items(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, ServiceError> {
        Ok(self.store.read_many(item_ids)?)
    }

    /// Apply an order-completion deduction batch.
    ///
    /// On success, publishes the decremented snapshots so the index's stock
    /// counts stay fresh. That publication is best-effort on top of
    /// best-effort: even a failed read-back only costs freshness, never the
    /// committed deduction.
    pub fn deduct_stock(
        &self,
        requests: &[DeductionRequest],
    ) -> Result<BatchResult, ServiceError> {
        let result = self.engine.deduct_batch(requests)?;

        if result.is_applied() {
            let ids: Vec<ItemId> = requests
                .iter()
                .filter(|r| r.quantity > 0)
                .map(|r| r.item_id)
                .collect();
            match self.store.read_many(&ids) {
                Ok(items) => {
                    for item in items {
                        let _ = self.publisher.item_upserted(item);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "post-deduction snapshot read failed; index stock will lag");
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tradepost_events::testing::FailingEventBus;
    use tradepost_events::{InMemoryEventBus, RoutingKey};

    type Bus = Arc<InMemoryEventBus<SyncEnvelope<ItemMutation>>>;

    fn service() -> (
        CatalogService<Arc<crate::InMemoryInventoryStore>, Bus>,
        Arc<crate::InMemoryInventoryStore>,
        Bus,
    ) {
        let store = Arc::new(crate::InMemoryInventoryStore::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let service = CatalogService::new(store.clone(), bus.clone());
        (service, store, bus)
    }

    fn draft(stock: u32) -> ItemDraft {
        ItemDraft {
            name: "Backpack".to_string(),
            price: 5400,
            image: "https://img.example/backpack.png".to_string(),
            stock,
            status: ItemStatus::Unlisted,
        }
    }

    #[test]
    fn general_update_cannot_change_status() {
        let (service, _store, _bus) = service();
        let item = service.create_item(draft(3)).unwrap();
        let listed = service
            .update_status(item.id, ItemStatus::Listed)
            .unwrap();
        assert_eq!(listed.status, ItemStatus::Listed);

        // The general update path has no way to express a status change.
        let updated = service
            .update_item(
                item.id,
                ItemPatch {
                    name: "Backpack v2".to_string(),
                    price: 5600,
                    image: item.image.clone(),
                    stock: 7,
                },
            )
            .unwrap();

        assert_eq!(updated.status, ItemStatus::Listed);
        assert_eq!(service.get_item(item.id).unwrap().status, ItemStatus::Listed);
    }

    #[test]
    fn invalid_patch_is_rejected_without_mutating() {
        let (service, _store, _bus) = service();
        let item = service.create_item(draft(3)).unwrap();

        let err = service
            .update_item(
                item.id,
                ItemPatch {
                    name: "   ".to_string(),
                    price: 5600,
                    image: String::new(),
                    stock: 7,
                },
            )
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(_)));
        assert_eq!(service.get_item(item.id).unwrap(), item);
    }

    #[test]
    fn concurrent_patches_never_revert_a_status_transition() {
        let (service, store, bus) = service();
        let item = service.create_item(draft(5)).unwrap();
        let id = item.id;
        let image = item.image.clone();

        // A second handle onto the same store, hammering the general update
        // path while the visibility transition commits.
        let editor = CatalogService::new(store.clone(), bus.clone());
        let writer = std::thread::spawn(move || {
            for round in 0..200u32 {
                editor
                    .update_item(
                        id,
                        ItemPatch {
                            name: format!("Backpack rev {round}"),
                            price: 5400,
                            image: image.clone(),
                            stock: 5,
                        },
                    )
                    .unwrap();
            }
        });

        std::thread::sleep(std::time::Duration::from_millis(2));
        service.update_status(id, ItemStatus::Listed).unwrap();
        writer.join().unwrap();

        // The transition committed after some patches and before others;
        // either way no patch may carry a stale status back into the store.
        assert_eq!(store.read(id).unwrap().unwrap().status, ItemStatus::Listed);
    }

    #[test]
    fn publish_failure_does_not_fail_the_mutation() {
        let store = Arc::new(crate::InMemoryInventoryStore::new());
        let service = CatalogService::new(store.clone(), FailingEventBus::new());

        let item = service.create_item(draft(2)).unwrap();
        // Still committed and readable from the primary store.
        assert_eq!(service.get_item(item.id).unwrap(), item);

        service
            .update_item(
                item.id,
                ItemPatch {
                    name: "Backpack v2".to_string(),
                    price: 6000,
                    image: String::new(),
                    stock: 2,
                },
            )
            .unwrap();
        service.delete_item(item.id).unwrap();
        assert!(matches!(
            service.get_item(item.id),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn mutations_publish_snapshots() {
        let (service, _store, bus) = service();
        let subscription = bus.subscribe();

        let item = service.create_item(draft(5)).unwrap();
        let env = subscription.try_recv().unwrap();
        assert_eq!(env.routing(), RoutingKey::ItemUpserted);
        match env.payload() {
            ItemMutation::Upserted { snapshot } => assert_eq!(snapshot, &item),
            other => panic!("expected upsert, got {other:?}"),
        }

        service.delete_item(item.id).unwrap();
        let env = subscription.try_recv().unwrap();
        assert_eq!(env.routing(), RoutingKey::ItemDeleted);
    }

    #[test]
    fn successful_deduction_publishes_fresh_stock() {
        let (service, _store, bus) = service();
        let item = service.create_item(draft(10)).unwrap();

        let subscription = bus.subscribe();
        let result = service
            .deduct_stock(&[DeductionRequest::new(item.id, 6)])
            .unwrap();
        assert!(result.is_applied());

        let env = subscription.try_recv().unwrap();
        match env.payload() {
            ItemMutation::Upserted { snapshot } => assert_eq!(snapshot.stock, 4),
            other => panic!("expected upsert, got {other:?}"),
        }
    }

    #[test]
    fn denied_deduction_publishes_nothing() {
        let (service, _store, bus) = service();
        let item = service.create_item(draft(1)).unwrap();

        let subscription = bus.subscribe();
        let result = service
            .deduct_stock(&[DeductionRequest::new(item.id, 5)])
            .unwrap();
        assert!(!result.is_applied());
        assert!(subscription.try_recv().is_err());
    }

    #[test]
    fn update_of_missing_item_is_not_found() {
        let (service, _store, _bus) = service();
        let err = service
            .update_item(
                ItemId::new(),
                ItemPatch {
                    name: "Ghost".to_string(),
                    price: 1,
                    image: String::new(),
                    stock: 0,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[test]
    fn batch_read_skips_unknown_ids() {
        let (service, _store, _bus) = service();
        let a = service.create_item(draft(1)).unwrap();
        let b = service.create_item(draft(2)).unwrap();

        let items = service
            .get_items(&[a.id, ItemId::new(), b.id])
            .unwrap();
        assert_eq!(items.len(), 2);
    }
}
