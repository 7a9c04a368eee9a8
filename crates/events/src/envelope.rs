use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routing::RoutingKey;

/// Envelope for a mutation event in flight between the primary store and the
/// search index.
///
/// This is the unit handed to the transport. It is immutable once constructed:
/// a redelivered message is byte-for-byte the same envelope, which is what
/// makes consumer-side deduplication-by-effect (idempotent apply) sound.
///
/// There is deliberately no sequence number here. Payloads are full snapshots,
/// so the consumer does not need commit order to converge — last delivered
/// wins per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEnvelope<E> {
    event_id: Uuid,
    routing: RoutingKey,

    /// When the originating mutation committed (business time).
    occurred_at: DateTime<Utc>,

    payload: E,
}

impl<E> SyncEnvelope<E> {
    pub fn new(event_id: Uuid, routing: RoutingKey, occurred_at: DateTime<Utc>, payload: E) -> Self {
        Self {
            event_id,
            routing,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn routing(&self) -> RoutingKey {
        self.routing
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
