//! Search index seam.
//!
//! The index is an eventually-convergent replica: upserts and deletes must be
//! safe to call redundantly, which is what lets the at-least-once transport
//! redeliver freely.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradepost_catalog::{Item, ItemStatus};
use tradepost_core::ItemId;

/// Denormalized document served to customer-facing queries.
///
/// Always built from a full primary-store snapshot, never patched
/// incrementally — that is the idempotency contract of the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub item_id: ItemId,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub stock: u32,
    pub status: ItemStatus,
}

impl From<Item> for IndexDocument {
    fn from(item: Item) -> Self {
        Self {
            item_id: item.id,
            name: item.name,
            price: item.price,
            image: item.image,
            stock: item.stock,
            status: item.status,
        }
    }
}

#[derive(Debug, Error)]
pub enum IndexError {
    /// The index backend is unreachable or rejected the operation. The event
    /// stays unacknowledged so the transport redelivers it.
    #[error("search index unavailable: {0}")]
    Unavailable(String),

    /// Internal lock poisoned by a panicked writer.
    #[error("index lock poisoned")]
    Poisoned,
}

/// Store of index documents.
///
/// Both operations must be **redundancy-safe**: upserting the same document
/// twice leaves the same state, and deleting an absent document is a no-op.
pub trait SearchIndex: Send + Sync {
    fn upsert(&self, document: IndexDocument) -> Result<(), IndexError>;

    fn delete(&self, item_id: ItemId) -> Result<(), IndexError>;
}

impl<I> SearchIndex for Arc<I>
where
    I: SearchIndex + ?Sized,
{
    fn upsert(&self, document: IndexDocument) -> Result<(), IndexError> {
        (**self).upsert(document)
    }

    fn delete(&self, item_id: ItemId) -> Result<(), IndexError> {
        (**self).delete(item_id)
    }
}

/// In-memory index for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<HashMap<ItemId, IndexDocument>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: ItemId) -> Option<IndexDocument> {
        self.documents
            .read()
            .ok()
            .and_then(|docs| docs.get(&item_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchIndex for InMemorySearchIndex {
    fn upsert(&self, document: IndexDocument) -> Result<(), IndexError> {
        let mut docs = self.documents.write().map_err(|_| IndexError::Poisoned)?;
        docs.insert(document.item_id, document);
        Ok(())
    }

    fn delete(&self, item_id: ItemId) -> Result<(), IndexError> {
        let mut docs = self.documents.write().map_err(|_| IndexError::Poisoned)?;
        docs.remove(&item_id);
        Ok(())
    }
}
