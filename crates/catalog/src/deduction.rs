use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tradepost_core::{ItemId, ValueObject};

/// One line of an order-completion deduction batch.
///
/// Transient: constructed per call, never persisted. A `quantity` of zero is
/// a no-op that trivially succeeds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl DeductionRequest {
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self { item_id, quantity }
    }
}

impl ValueObject for DeductionRequest {}

/// Per-item result of an atomic conditional decrement.
///
/// These are business outcomes, not errors: the store reports them as values
/// and the deduction engine aggregates them into a [`BatchResult`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeductionOutcome {
    /// `stock >= quantity` held; stock was decremented.
    Applied,
    /// `stock < quantity`; nothing was mutated.
    InsufficientStock,
    /// No record for the identifier; nothing was mutated.
    NotFound,
}

/// Aggregated outcome of a deduction batch.
///
/// `Failed` means every decrement that had been applied was compensated back;
/// the named items are the ones that caused the abort, so the order workflow
/// can report a precise out-of-stock error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchResult {
    AllApplied,
    Failed { failed: BTreeSet<ItemId> },
}

impl BatchResult {
    pub fn is_applied(&self) -> bool {
        matches!(self, BatchResult::AllApplied)
    }

    pub fn failed_items(&self) -> Option<&BTreeSet<ItemId>> {
        match self {
            BatchResult::AllApplied => None,
            BatchResult::Failed { failed } => Some(failed),
        }
    }
}
