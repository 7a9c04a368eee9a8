//! Postgres-backed inventory store.
//!
//! This is the cross-process deployment of the store: the conditional
//! decrement is a single WHERE-guarded `UPDATE`, so the check-and-decrement is
//! atomic at the database level and holds across any number of service
//! instances sharing the pool.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE items (
//!     id          UUID PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     price       BIGINT NOT NULL CHECK (price >= 0),
//!     image       TEXT NOT NULL,
//!     stock       BIGINT NOT NULL CHECK (stock >= 0),
//!     status      TEXT NOT NULL,
//!     updated_at  TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! The `CHECK (stock >= 0)` constraint is a second line of defense; the guard
//! in the decrement's WHERE clause is what callers rely on.
//!
//! All SQLx errors map to [`StoreError::Unavailable`] — from the write path's
//! perspective a constraint violation and a dropped connection are the same
//! thing: the mutation did not commit.

use std::sync::Arc;

use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;

use tradepost_catalog::{DeductionOutcome, Item, ItemStatus};
use tradepost_core::ItemId;

use super::store::{InventoryStore, StoreError};

/// Postgres-backed item storage.
///
/// `Send + Sync`; the SQLx pool handles connection management across threads.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn read(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, price, image, stock, status, updated_at FROM items WHERE id = $1",
        )
        .bind(item_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(item_from_row).transpose()
    }

    #[instrument(skip(self, item_ids), fields(count = item_ids.len()), err)]
    pub async fn read_many(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, StoreError> {
        let ids: Vec<uuid::Uuid> = item_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(
            "SELECT id, name, price, image, stock, status, updated_at FROM items WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    pub async fn write(&self, item: Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (id, name, price, image, stock, status, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                image = EXCLUDED.image,
                stock = EXCLUDED.stock,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.image)
        .bind(i64::from(item.stock))
        .bind(status_as_str(item.status))
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn delete(&self, item_id: ItemId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    /// Guarded read-modify-write: `SELECT ... FOR UPDATE` inside a
    /// transaction, so the row is locked from the read through the write-back
    /// and a concurrent status transition cannot be reverted by a racing
    /// catalog edit.
    #[instrument(skip(self, apply), fields(item_id = %item_id), err)]
    pub async fn update(
        &self,
        item_id: ItemId,
        apply: &mut dyn FnMut(&mut Item),
    ) -> Result<Option<Item>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(
            "SELECT id, name, price, image, stock, status, updated_at FROM items \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(item_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        // Dropping the transaction unread rolls it back.
        let Some(row) = row else {
            return Ok(None);
        };
        let mut item = item_from_row(row)?;
        apply(&mut item);

        sqlx::query(
            r#"
            UPDATE items SET
                name = $2,
                price = $3,
                image = $4,
                stock = $5,
                status = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.image)
        .bind(i64::from(item.stock))
        .bind(status_as_str(item.status))
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(item))
    }

    /// Atomic check-and-decrement.
    ///
    /// The `stock >= $2` guard rides in the UPDATE itself, eliminating the
    /// read-check-write race; `rows_affected == 0` is disambiguated with a
    /// follow-up existence probe.
    #[instrument(skip(self), fields(item_id = %item_id, quantity), err)]
    pub async fn conditional_decrement(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<DeductionOutcome, StoreError> {
        let result = sqlx::query(
            "UPDATE items SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
        )
        .bind(item_id.as_uuid())
        .bind(i64::from(quantity))
        .execute(&*self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 1 {
            return Ok(DeductionOutcome::Applied);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
            .bind(item_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if exists {
            Ok(DeductionOutcome::InsufficientStock)
        } else {
            Ok(DeductionOutcome::NotFound)
        }
    }

    #[instrument(skip(self), fields(item_id = %item_id, quantity), err)]
    pub async fn increment(&self, item_id: ItemId, quantity: u32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE items SET stock = stock + $2 WHERE id = $1")
            .bind(item_id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&*self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingItem(item_id));
        }
        Ok(())
    }
}

/// Sync adapter so the service layer (synchronous end-to-end) can run against
/// Postgres.
///
/// Must not be called from within the runtime's own worker threads —
/// `block_on` would deadlock. Intended for request threads that live outside
/// the IO runtime.
#[derive(Debug, Clone)]
pub struct BlockingPostgresStore {
    inner: PostgresInventoryStore,
    handle: tokio::runtime::Handle,
}

impl BlockingPostgresStore {
    pub fn new(inner: PostgresInventoryStore, handle: tokio::runtime::Handle) -> Self {
        Self { inner, handle }
    }
}

impl InventoryStore for BlockingPostgresStore {
    fn read(&self, item_id: ItemId) -> Result<Option<Item>, StoreError> {
        self.handle.block_on(self.inner.read(item_id))
    }

    fn read_many(&self, item_ids: &[ItemId]) -> Result<Vec<Item>, StoreError> {
        self.handle.block_on(self.inner.read_many(item_ids))
    }

    fn write(&self, item: Item) -> Result<(), StoreError> {
        self.handle.block_on(self.inner.write(item))
    }

    fn delete(&self, item_id: ItemId) -> Result<(), StoreError> {
        self.handle.block_on(self.inner.delete(item_id))
    }

    fn update(
        &self,
        item_id: ItemId,
        apply: &mut dyn FnMut(&mut Item),
    ) -> Result<Option<Item>, StoreError> {
        self.handle.block_on(self.inner.update(item_id, apply))
    }

    fn conditional_decrement(
        &self,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<DeductionOutcome, StoreError> {
        self.handle
            .block_on(self.inner.conditional_decrement(item_id, quantity))
    }

    fn increment(&self, item_id: ItemId, quantity: u32) -> Result<(), StoreError> {
        self.handle.block_on(self.inner.increment(item_id, quantity))
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn status_as_str(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Unlisted => "unlisted",
        ItemStatus::Listed => "listed",
    }
}

fn status_from_str(s: &str) -> Result<ItemStatus, StoreError> {
    match s {
        "unlisted" => Ok(ItemStatus::Unlisted),
        "listed" => Ok(ItemStatus::Listed),
        other => Err(StoreError::Unavailable(format!(
            "corrupt status value in items row: {other:?}"
        ))),
    }
}

fn item_from_row(row: PgRow) -> Result<Item, StoreError> {
    let stock: i64 = row.try_get("stock").map_err(map_sqlx_error)?;
    let stock = u32::try_from(stock)
        .map_err(|_| StoreError::Unavailable(format!("corrupt stock value in items row: {stock}")))?;
    let status: String = row.try_get("status").map_err(map_sqlx_error)?;

    Ok(Item {
        id: ItemId::from_uuid(row.try_get("id").map_err(map_sqlx_error)?),
        name: row.try_get("name").map_err(map_sqlx_error)?,
        price: row.try_get("price").map_err(map_sqlx_error)?,
        image: row.try_get("image").map_err(map_sqlx_error)?,
        stock,
        status: status_from_str(&status)?,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_error)?,
    })
}
