//! # Holding Repository
//!
//! Database operations for asset holdings.
//!
//! A holding row is only `(id, brokerageId)`. Quantity, average cost,
//! invested value and current value were dropped in schema version 4 and
//! are computed outside the store; nothing here reads or writes them.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use folio_core::{AssetHolding, BrokerageId, EntityId, HoldingId};

const SELECT_HOLDING: &str = r#"SELECT id, "brokerageId" FROM asset_holdings"#;

/// Repository for asset holding database operations.
#[derive(Debug, Clone)]
pub struct HoldingRepository {
    pool: SqlitePool,
}

impl HoldingRepository {
    /// Creates a new HoldingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HoldingRepository { pool }
    }

    /// Inserts a holding at `brokerage_id` and returns its id.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Brokerage doesn't exist
    pub async fn insert(&self, brokerage_id: BrokerageId) -> DbResult<HoldingId> {
        debug!(brokerage_id = %brokerage_id, "Inserting holding");

        let result = sqlx::query(r#"INSERT INTO asset_holdings ("brokerageId") VALUES (?1)"#)
            .bind(brokerage_id.get())
            .execute(&self.pool)
            .await?;

        Ok(EntityId::new(result.last_insert_rowid())?)
    }

    /// Gets a holding by its ID.
    pub async fn get_by_id(&self, id: HoldingId) -> DbResult<Option<AssetHolding>> {
        let holding = sqlx::query_as::<_, AssetHolding>(&format!("{SELECT_HOLDING} WHERE id = ?1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(holding)
    }

    /// Lists all holdings ordered by id.
    pub async fn list_all(&self) -> DbResult<Vec<AssetHolding>> {
        let holdings = sqlx::query_as::<_, AssetHolding>(&format!("{SELECT_HOLDING} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(holdings)
    }

    /// Lists the holdings kept at one brokerage.
    pub async fn list_by_brokerage(&self, brokerage_id: BrokerageId) -> DbResult<Vec<AssetHolding>> {
        let holdings = sqlx::query_as::<_, AssetHolding>(&format!(
            r#"{SELECT_HOLDING} WHERE "brokerageId" = ?1 ORDER BY id"#
        ))
        .bind(brokerage_id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(holdings)
    }

    /// Moves a holding to another brokerage.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Holding doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Target brokerage doesn't exist
    pub async fn update(&self, id: HoldingId, brokerage_id: BrokerageId) -> DbResult<()> {
        debug!(id = %id, brokerage_id = %brokerage_id, "Updating holding");

        let result = sqlx::query(r#"UPDATE asset_holdings SET "brokerageId" = ?2 WHERE id = ?1"#)
            .bind(id.get())
            .bind(brokerage_id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("AssetHolding", id));
        }

        Ok(())
    }

    /// Deletes a holding.
    pub async fn delete(&self, id: HoldingId) -> DbResult<()> {
        debug!(id = %id, "Deleting holding");

        let result = sqlx::query("DELETE FROM asset_holdings WHERE id = ?1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("AssetHolding", id));
        }

        Ok(())
    }

    /// Counts holdings.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM asset_holdings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
