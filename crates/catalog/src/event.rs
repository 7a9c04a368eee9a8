use serde::{Deserialize, Serialize};

use tradepost_core::ItemId;
use tradepost_events::RoutingKey;

use crate::item::Item;

/// Integration event describing a committed primary-store mutation.
///
/// Immutable once constructed, delivered at-least-once. Upserts carry the
/// **full snapshot at publish time** rather than a delta — that is what makes
/// consumer-side application idempotent and order-insensitive: re-applying the
/// same snapshot, or applying a newer one first, converges to the same index
/// document.
///
/// Create, update, status change and stock deduction all publish `Upserted`;
/// the index does not care which operation produced the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemMutation {
    Upserted { snapshot: Item },
    Deleted { item_id: ItemId },
}

impl ItemMutation {
    pub fn routing_key(&self) -> RoutingKey {
        match self {
            ItemMutation::Upserted { .. } => RoutingKey::ItemUpserted,
            ItemMutation::Deleted { .. } => RoutingKey::ItemDeleted,
        }
    }

    pub fn item_id(&self) -> ItemId {
        match self {
            ItemMutation::Upserted { snapshot } => snapshot.id,
            ItemMutation::Deleted { item_id } => *item_id,
        }
    }
}
