//! Authoritative item storage (source of truth for price, stock, status).

pub mod in_memory;
pub mod postgres;
pub mod store;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::{BlockingPostgresStore, PostgresInventoryStore};
pub use store::{InventoryStore, StoreError};
