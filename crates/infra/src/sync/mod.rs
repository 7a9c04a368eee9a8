//! Consumer side of the write path: converging the search index.

pub mod dead_letter;
pub mod index;
pub mod synchronizer;
pub mod worker;

pub use dead_letter::{DeadLetter, DeadLetterQueue};
pub use index::{InMemorySearchIndex, IndexDocument, IndexError, SearchIndex};
pub use synchronizer::{IndexSynchronizer, SyncError};
pub use worker::{SyncWorker, WorkerHandle};
