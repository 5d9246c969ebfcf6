//! # Brokerage Repository
//!
//! Database operations for brokerages.
//!
//! ## Deletion Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  asset_holdings.brokerageId REFERENCES brokerages(id) ON DELETE RESTRICT│
//! │                                                                         │
//! │  delete(brokerage with 0 holdings)  → Ok(())                           │
//! │  delete(brokerage with N holdings)  → Err(ForeignKeyViolation)         │
//! │                                       nothing is removed               │
//! │  delete(unknown id)                 → Err(NotFound)                    │
//! │                                                                         │
//! │  Holdings must be deleted (or moved) first. No cascade.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use folio_core::{Brokerage, BrokerageId, EntityId, MandatoryText};

/// Repository for brokerage database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.brokerages();
///
/// let id = repo.insert(&MandatoryText::new("XYZ Corp")?).await?;
/// let brokerage = repo.get_by_id(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BrokerageRepository {
    pool: SqlitePool,
}

impl BrokerageRepository {
    /// Creates a new BrokerageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BrokerageRepository { pool }
    }

    /// Inserts a brokerage and returns its store-assigned id.
    pub async fn insert(&self, name: &MandatoryText) -> DbResult<BrokerageId> {
        debug!(name = %name, "Inserting brokerage");

        let result = sqlx::query("INSERT INTO brokerages (name) VALUES (?1)")
            .bind(name.as_str())
            .execute(&self.pool)
            .await?;

        let id = EntityId::new(result.last_insert_rowid())?;
        debug!(id = %id, "Brokerage inserted");
        Ok(id)
    }

    /// Gets a brokerage by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Brokerage))` - Brokerage found
    /// * `Ok(None)` - Brokerage not found
    pub async fn get_by_id(&self, id: BrokerageId) -> DbResult<Option<Brokerage>> {
        let brokerage =
            sqlx::query_as::<_, Brokerage>("SELECT id, name FROM brokerages WHERE id = ?1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await?;

        Ok(brokerage)
    }

    /// Gets the oldest brokerage with exactly this name.
    pub async fn get_by_name(&self, name: &MandatoryText) -> DbResult<Option<Brokerage>> {
        let brokerage = sqlx::query_as::<_, Brokerage>(
            "SELECT id, name FROM brokerages WHERE name = ?1 ORDER BY id LIMIT 1",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(brokerage)
    }

    /// Returns the brokerage with this name, creating it on first reference.
    ///
    /// Lookup and insert share one transaction. It takes the write lock up
    /// front (`BEGIN IMMEDIATE`) so concurrent callers queue on the busy
    /// timeout instead of failing a read-to-write upgrade with SQLITE_BUSY.
    pub async fn get_or_create(&self, name: &MandatoryText) -> DbResult<Brokerage> {
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let existing = sqlx::query_as::<_, Brokerage>(
            "SELECT id, name FROM brokerages WHERE name = ?1 ORDER BY id LIMIT 1",
        )
        .bind(name.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(brokerage) = existing {
            tx.commit().await?;
            return Ok(brokerage);
        }

        debug!(name = %name, "Creating brokerage on first reference");
        let result = sqlx::query("INSERT INTO brokerages (name) VALUES (?1)")
            .bind(name.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Brokerage {
            id: result.last_insert_rowid(),
            name: name.as_str().to_string(),
        })
    }

    /// Lists all brokerages ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<Brokerage>> {
        let brokerages =
            sqlx::query_as::<_, Brokerage>("SELECT id, name FROM brokerages ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(brokerages)
    }

    /// Renames a brokerage.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Brokerage doesn't exist
    pub async fn update(&self, id: BrokerageId, name: &MandatoryText) -> DbResult<()> {
        debug!(id = %id, name = %name, "Updating brokerage");

        let result = sqlx::query("UPDATE brokerages SET name = ?2 WHERE id = ?1")
            .bind(id.get())
            .bind(name.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Brokerage", id));
        }

        Ok(())
    }

    /// Deletes a brokerage that has no holdings.
    ///
    /// ## Returns
    /// * `Ok(())` - Deleted
    /// * `Err(DbError::NotFound)` - Brokerage doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Holdings still reference it
    pub async fn delete(&self, id: BrokerageId) -> DbResult<()> {
        debug!(id = %id, "Deleting brokerage");

        let result = sqlx::query("DELETE FROM brokerages WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Brokerage", id));
        }

        Ok(())
    }

    /// Counts brokerages.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM brokerages")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
