use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradepost_core::{DomainResult, Entity, ItemId, ValueObject};

/// Customer-facing visibility of an item.
///
/// Controls whether the item shows up in the search index's public queries.
/// Never changed through the general update path — only through the dedicated
/// status operation ([`Item::set_status`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Unlisted,
    Listed,
}

/// Authoritative catalog item record.
///
/// Owned by the inventory store; mutated only through the operations below.
/// `stock` is a `u32`, so the `stock >= 0` invariant holds by construction —
/// the store's conditional decrement is what keeps it from wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: i64,
    /// Display image reference (opaque to this core).
    pub image: String,
    pub stock: u32,
    pub status: ItemStatus,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item.
///
/// Creation may set the initial visibility; subsequent visibility changes go
/// through the dedicated status operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub price: i64,
    pub image: String,
    pub stock: u32,
    pub status: ItemStatus,
}

/// Input for the general update path.
///
/// Deliberately has no `status` field: a catalog edit cannot accidentally
/// re-list or unlist an item, no matter what the caller sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: String,
    pub price: i64,
    pub image: String,
    pub stock: u32,
}

impl ValueObject for ItemDraft {}
impl ValueObject for ItemPatch {}

impl Item {
    /// Create a new item from a draft.
    pub fn create(id: ItemId, draft: ItemDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        validate(&draft.name, draft.price)?;
        Ok(Self {
            id,
            name: draft.name,
            price: draft.price,
            image: draft.image,
            stock: draft.stock,
            status: draft.status,
            updated_at: now,
        })
    }

    /// Apply a general catalog edit. Preserves `status` by construction.
    pub fn apply_patch(&mut self, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<()> {
        validate(&patch.name, patch.price)?;
        self.name = patch.name;
        self.price = patch.price;
        self.image = patch.image;
        self.stock = patch.stock;
        self.updated_at = now;
        Ok(())
    }

    /// Dedicated visibility transition.
    pub fn set_status(&mut self, status: ItemStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_listed(&self) -> bool {
        self.status == ItemStatus::Listed
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate(name: &str, price: i64) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(tradepost_core::DomainError::validation(
            "name cannot be empty",
        ));
    }
    if price < 0 {
        return Err(tradepost_core::DomainError::validation(
            "price cannot be negative",
        ));
    }
    Ok(())
}
