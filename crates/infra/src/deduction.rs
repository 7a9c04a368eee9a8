//! Overselling-safe batch stock deduction.
//!
//! One order completion arrives as a batch of (item, quantity) lines. The
//! store only offers per-item atomicity, so batch-level all-or-nothing is
//! built the saga way: apply each decrement optimistically, and if any line is
//! denied, undo every decrement that did apply before reporting failure.
//!
//! The undo is a plain additive increment. That is safe without extra locking:
//! increments commute with concurrent decrements, and the decrement guard is
//! the only thing that can refuse — worst case a concurrent batch is denied
//! that would have fit after the compensation lands, which is an acceptable
//! (and unavoidable) race under per-item atomicity.
//!
//! The one outcome that must never be swallowed is a failed undo: stock would
//! stay understated with nothing left to correct it. That escalates as
//! [`BatchError::CompensationFailed`], the single operator-attention error in
//! this core.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{error, warn};

use tradepost_catalog::{BatchResult, DeductionOutcome, DeductionRequest};
use tradepost_core::ItemId;

use crate::inventory_store::{InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum BatchError {
    /// The store failed mid-batch. Decrements applied before the failure were
    /// compensated; the batch is not committed.
    #[error("store failure during deduction: {0}")]
    Store(#[from] StoreError),

    /// An undo write failed after a batch abort. Stock for `item_id` is
    /// understated until an operator repairs it.
    #[error("compensation failed for item {item_id}: {source}")]
    CompensationFailed {
        item_id: ItemId,
        #[source]
        source: StoreError,
    },
}

/// Applies deduction batches with all-or-nothing semantics from the caller's
/// perspective.
#[derive(Debug)]
pub struct StockDeductionEngine<S> {
    store: S,
}

impl<S> StockDeductionEngine<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply one order-completion batch.
    ///
    /// Evaluates every line before deciding, so a `Failed` result names all
    /// offending items, not just the first. Zero-quantity lines are skipped.
    /// Once this returns, no partially-applied batch is observable: either
    /// every line committed, or every applied line was compensated back.
    ///
    /// `Err` is reserved for infrastructure trouble; a denied batch is an
    /// `Ok(BatchResult::Failed { .. })` — a business outcome the order
    /// workflow decides how to handle. This engine never retries denials.
    pub fn deduct_batch(&self, requests: &[DeductionRequest]) -> Result<BatchResult, BatchError> {
        let mut applied: Vec<DeductionRequest> = Vec::with_capacity(requests.len());
        let mut failed: BTreeSet<ItemId> = BTreeSet::new();

        for request in requests {
            if request.quantity == 0 {
                continue;
            }
            match self
                .store
                .conditional_decrement(request.item_id, request.quantity)
            {
                Ok(DeductionOutcome::Applied) => applied.push(*request),
                Ok(DeductionOutcome::InsufficientStock) => {
                    warn!(
                        item_id = %request.item_id,
                        quantity = request.quantity,
                        "deduction denied: insufficient stock"
                    );
                    failed.insert(request.item_id);
                }
                Ok(DeductionOutcome::NotFound) => {
                    // A missing item is a caller or catalog-sync bug, not
                    // transient contention; it hard-fails the batch.
                    warn!(item_id = %request.item_id, "deduction denied: unknown item");
                    failed.insert(request.item_id);
                }
                Err(err) => {
                    self.compensate(&applied)?;
                    return Err(BatchError::Store(err));
                }
            }
        }

        if failed.is_empty() {
            return Ok(BatchResult::AllApplied);
        }

        self.compensate(&applied)?;
        Ok(BatchResult::Failed { failed })
    }

    fn compensate(&self, applied: &[DeductionRequest]) -> Result<(), BatchError> {
        for request in applied {
            if let Err(source) = self.store.increment(request.item_id, request.quantity) {
                error!(
                    item_id = %request.item_id,
                    quantity = request.quantity,
                    error = %source,
                    "stock compensation failed; count understated until repaired"
                );
                return Err(BatchError::CompensationFailed {
                    item_id: request.item_id,
                    source,
                });
            }
        }
        Ok(())
    }
}
