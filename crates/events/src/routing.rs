//! Routing for index-synchronization messages.
//!
//! One logical exchange, two routing keys: upserts (create/update/status/stock
//! changes, carrying a full snapshot) and deletes (identifier only). A broker
//! that preserves per-key order is sufficient but not required — payloads are
//! full snapshots, so per-item ordering does not affect convergence.

use serde::{Deserialize, Serialize};

/// Logical exchange all catalog sync messages are addressed to.
pub const SYNC_EXCHANGE: &str = "items.sync";

/// Routing key of a sync message within [`SYNC_EXCHANGE`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingKey {
    /// An item was created or changed; the payload carries the full snapshot.
    ItemUpserted,
    /// An item was removed; the payload carries the identifier only.
    ItemDeleted,
}

impl RoutingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingKey::ItemUpserted => "item.upserted",
            RoutingKey::ItemDeleted => "item.deleted",
        }
    }

    /// The exchange this key is addressed within. A broker binding needs the
    /// (exchange, key) pair; log lines carry both so lagging messages can be
    /// traced to their binding.
    pub fn exchange(&self) -> &'static str {
        SYNC_EXCHANGE
    }
}

impl core::fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
