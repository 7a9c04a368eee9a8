//! `tradepost-infra` — storage, transport wiring, and orchestration for the
//! catalog write path.
//!
//! Layout mirrors the data flow: mutations commit to the
//! [`inventory_store`], the [`catalog_service`] then hands a snapshot to the
//! [`publisher`] (best-effort), and the [`sync`] worker converges the search
//! index on the consumer side. [`deduction`] is the parallel order-completion
//! flow against the same store.

pub mod catalog_service;
pub mod deduction;
pub mod inventory_store;
pub mod publisher;
pub mod sync;

#[cfg(test)]
mod integration_tests;

pub use catalog_service::{CatalogService, ServiceError};
pub use deduction::{BatchError, StockDeductionEngine};
pub use inventory_store::{
    InMemoryInventoryStore, InventoryStore, StoreError,
};
pub use publisher::{MutationPublisher, PublishOutcome};
pub use sync::{
    DeadLetter, DeadLetterQueue, InMemorySearchIndex, IndexDocument, IndexError,
    IndexSynchronizer, SearchIndex, SyncError, SyncWorker, WorkerHandle,
};
