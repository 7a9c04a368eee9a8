//! Catalog domain module.
//!
//! This crate contains the sellable-item model and the deduction/event value
//! types, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod deduction;
pub mod event;
pub mod item;

pub use deduction::{BatchResult, DeductionOutcome, DeductionRequest};
pub use event::ItemMutation;
pub use item::{Item, ItemDraft, ItemPatch, ItemStatus};
