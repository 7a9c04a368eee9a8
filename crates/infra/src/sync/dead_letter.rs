//! Parking lot for events that exhausted redelivery.
//!
//! The consumer side must never silently drop an event after repeated
//! failure (unlike the producer side, which may drop on first failure).
//! Exhausted events land here for manual inspection and replay.

use std::sync::{Mutex, MutexGuard};

use tradepost_catalog::ItemMutation;
use tradepost_events::SyncEnvelope;

/// One dead-lettered event with its failure context.
#[derive(Debug)]
pub struct DeadLetter {
    pub envelope: SyncEnvelope<ItemMutation>,
    pub attempts: u32,
    pub last_error: String,
}

/// Destination for events the worker gave up on.
#[derive(Debug, Default)]
pub struct DeadLetterQueue {
    letters: Mutex<Vec<DeadLetter>>,
}

impl DeadLetterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, letter: DeadLetter) {
        self.guard().push(letter);
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything parked so far (operator replay path).
    pub fn drain(&self) -> Vec<DeadLetter> {
        self.guard().drain(..).collect()
    }

    // A poisoned mutex still holds every parked letter; recover the guard
    // instead of making them unreachable.
    fn guard(&self) -> MutexGuard<'_, Vec<DeadLetter>> {
        self.letters.lock().unwrap_or_else(|e| e.into_inner())
    }
}
