//! Integration tests for the full write-path pipeline.
//!
//! Tests: mutation → inventory store → bus → sync worker → search index.
//!
//! Verifies:
//! - The index converges to the last committed primary-store state
//! - Duplicate delivery is harmless (idempotent apply)
//! - A failing index triggers bounded redelivery, then dead-lettering
//! - Deductions propagate fresh stock counts

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tradepost_catalog::{
    DeductionRequest, ItemDraft, ItemMutation, ItemPatch, ItemStatus,
};
use tradepost_core::ItemId;
use tradepost_events::{EventBus, InMemoryEventBus, SyncEnvelope};

use crate::catalog_service::CatalogService;
use crate::inventory_store::InMemoryInventoryStore;
use crate::sync::{
    DeadLetterQueue, IndexDocument, IndexError, IndexSynchronizer, InMemorySearchIndex,
    SearchIndex, SyncWorker, WorkerHandle,
};

type Bus = Arc<InMemoryEventBus<SyncEnvelope<ItemMutation>>>;
type Service = CatalogService<Arc<InMemoryInventoryStore>, Bus>;

const MAX_ATTEMPTS: u32 = 3;

fn pipeline() -> (
    Service,
    Bus,
    Arc<InMemorySearchIndex>,
    Arc<DeadLetterQueue>,
    WorkerHandle,
) {
    let store = Arc::new(InMemoryInventoryStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let index = Arc::new(InMemorySearchIndex::new());
    let dead_letters = Arc::new(DeadLetterQueue::new());

    // Worker subscribes inside spawn, before the service publishes anything.
    let worker = SyncWorker::spawn(
        "items-sync",
        bus.clone(),
        IndexSynchronizer::new(index.clone()),
        MAX_ATTEMPTS,
        dead_letters.clone(),
    );

    let service = CatalogService::new(store, bus.clone());
    (service, bus, index, dead_letters, worker)
}

/// Poll until `predicate` holds or the convergence window expires.
fn converges(predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

fn draft(stock: u32) -> ItemDraft {
    ItemDraft {
        name: "Lantern".to_string(),
        price: 2300,
        image: "https://img.example/lantern.png".to_string(),
        stock,
        status: ItemStatus::Listed,
    }
}

#[test]
fn create_update_delete_converge_in_the_index() {
    let (service, _bus, index, dead_letters, worker) = pipeline();

    let item = service.create_item(draft(5)).unwrap();
    assert!(converges(|| index.get(item.id).is_some()));
    assert_eq!(index.get(item.id).unwrap().stock, 5);

    service
        .update_item(
            item.id,
            ItemPatch {
                name: "Lantern XL".to_string(),
                price: 2900,
                image: item.image.clone(),
                stock: 8,
            },
        )
        .unwrap();
    assert!(converges(|| {
        index
            .get(item.id)
            .is_some_and(|doc| doc.name == "Lantern XL" && doc.stock == 8)
    }));

    service.delete_item(item.id).unwrap();
    assert!(converges(|| index.get(item.id).is_none()));

    assert!(dead_letters.is_empty());
    worker.shutdown();
}

#[test]
fn status_change_reaches_the_index_via_its_own_operation() {
    let (service, _bus, index, _dead_letters, worker) = pipeline();

    let item = service
        .create_item(ItemDraft {
            status: ItemStatus::Unlisted,
            ..draft(1)
        })
        .unwrap();
    assert!(converges(|| {
        index
            .get(item.id)
            .is_some_and(|doc| doc.status == ItemStatus::Unlisted)
    }));

    service.update_status(item.id, ItemStatus::Listed).unwrap();
    assert!(converges(|| {
        index
            .get(item.id)
            .is_some_and(|doc| doc.status == ItemStatus::Listed)
    }));

    worker.shutdown();
}

#[test]
fn duplicated_delivery_is_idempotent() {
    let (service, bus, index, dead_letters, worker) = pipeline();

    let item = service.create_item(draft(2)).unwrap();
    service
        .update_item(
            item.id,
            ItemPatch {
                name: item.name.clone(),
                price: 9900,
                image: item.image.clone(),
                stock: 2,
            },
        )
        .unwrap();
    assert!(converges(|| {
        index.get(item.id).is_some_and(|doc| doc.price == 9900)
    }));
    let settled = index.get(item.id).unwrap();

    // Simulate broker redelivery: the same update crosses the wire again.
    let envelope = SyncEnvelope::new(
        uuid::Uuid::now_v7(),
        tradepost_events::RoutingKey::ItemUpserted,
        chrono::Utc::now(),
        ItemMutation::Upserted {
            snapshot: service.get_item(item.id).unwrap(),
        },
    );
    let wire = serde_json::to_string(&envelope).unwrap();
    let redelivered: SyncEnvelope<ItemMutation> = serde_json::from_str(&wire).unwrap();
    bus.publish(redelivered.clone()).unwrap();
    bus.publish(redelivered).unwrap();

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(index.get(item.id).unwrap(), settled);
    assert_eq!(index.len(), 1);
    assert!(dead_letters.is_empty());

    worker.shutdown();
}

#[test]
fn deduction_refreshes_index_stock() {
    let (service, _bus, index, _dead_letters, worker) = pipeline();

    let item = service.create_item(draft(10)).unwrap();
    let result = service
        .deduct_stock(&[DeductionRequest::new(item.id, 6)])
        .unwrap();
    assert!(result.is_applied());

    assert!(converges(|| {
        index.get(item.id).is_some_and(|doc| doc.stock == 4)
    }));

    worker.shutdown();
}

/// Index double that fails a fixed number of times before recovering.
struct FlakyIndex {
    inner: InMemorySearchIndex,
    failures_left: AtomicU32,
}

impl FlakyIndex {
    fn failing(times: u32) -> Self {
        Self {
            inner: InMemorySearchIndex::new(),
            failures_left: AtomicU32::new(times),
        }
    }

    fn trip(&self) -> Result<(), IndexError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(IndexError::Unavailable("index briefly down".to_string()));
        }
        Ok(())
    }
}

impl SearchIndex for FlakyIndex {
    fn upsert(&self, document: IndexDocument) -> Result<(), IndexError> {
        self.trip()?;
        self.inner.upsert(document)
    }

    fn delete(&self, item_id: ItemId) -> Result<(), IndexError> {
        self.trip()?;
        self.inner.delete(item_id)
    }
}

#[test]
fn transient_index_failure_is_absorbed_by_redelivery() {
    let store = Arc::new(InMemoryInventoryStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let index = Arc::new(FlakyIndex::failing(MAX_ATTEMPTS - 1));
    let dead_letters = Arc::new(DeadLetterQueue::new());
    let worker = SyncWorker::spawn(
        "items-sync-flaky",
        bus.clone(),
        IndexSynchronizer::new(index.clone()),
        MAX_ATTEMPTS,
        dead_letters.clone(),
    );
    let service = CatalogService::new(store, bus);

    let item = service.create_item(draft(3)).unwrap();
    assert!(converges(|| index.inner.get(item.id).is_some()));
    assert!(dead_letters.is_empty());

    worker.shutdown();
}

#[test]
fn exhausted_redelivery_dead_letters_instead_of_dropping() {
    let store = Arc::new(InMemoryInventoryStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let index = Arc::new(FlakyIndex::failing(u32::MAX));
    let dead_letters = Arc::new(DeadLetterQueue::new());
    let worker = SyncWorker::spawn(
        "items-sync-dead",
        bus.clone(),
        IndexSynchronizer::new(index.clone()),
        MAX_ATTEMPTS,
        dead_letters.clone(),
    );
    let service = CatalogService::new(store, bus);

    let item = service.create_item(draft(1)).unwrap();
    assert!(converges(|| !dead_letters.is_empty()));

    let letters = dead_letters.drain();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].attempts, MAX_ATTEMPTS);
    assert_eq!(letters[0].envelope.payload().item_id(), item.id);
    // Never applied, never silently dropped.
    assert!(index.inner.get(item.id).is_none());

    worker.shutdown();
}
