//! # Database Migrations
//!
//! Explicitly registered, versioned schema migrations for Folio.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::open / DatabaseBuilder::build                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Read PRAGMA user_version  (0 for a brand-new file)                    │
//! │       │                                                                 │
//! │       ├── == target?  → nothing to do                                  │
//! │       ├── >  target?  → refuse (file written by a newer app)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For each version k+1 ..= target, strictly in order:                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  BEGIN IMMEDIATE                                                │   │
//! │  │    check live shape == expected "from" shape                    │   │
//! │  │    run the step's SchemaOps                                     │   │
//! │  │    PRAGMA foreign_key_check  (must be clean)                    │   │
//! │  │    PRAGMA user_version = k+1                                    │   │
//! │  │  COMMIT   ← any failure: ROLLBACK, version stays at k           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  App continues startup                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Append a `Migration` with the next version number to [`registry`]
//! 2. Express it with [`SchemaOp`]s; never write a new `CREATE TABLE` by hand
//! 3. **NEVER** modify existing migrations - always add new ones
//! 4. Bump [`SCHEMA_VERSION`]

use sqlx::{Connection, Row, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::schema::{
    live_columns, live_index_exists, ColumnDef, IndexDef, OnDelete, Schema, SchemaOp, SqlType,
    TableDef, ASSET_HOLDINGS, BROKERAGES,
};

/// Schema version this build of the application expects.
pub const SCHEMA_VERSION: u32 = 4;

// =============================================================================
// Migration
// =============================================================================

/// One versioned step: the ops that turn schema `version - 1` into `version`.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub ops: Vec<SchemaOp>,
}

impl Migration {
    pub fn new(version: u32, description: &'static str, ops: Vec<SchemaOp>) -> Self {
        Migration {
            version,
            description,
            ops,
        }
    }
}

/// Result of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Stored version before the run.
    pub from: u32,
    /// Stored version after the run.
    pub to: u32,
    /// Versions applied, in order. Empty when already up to date.
    pub applied: Vec<u32>,
}

/// Stored vs. expected schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub current: u32,
    pub target: u32,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.current == self.target
    }

    pub fn pending(&self) -> u32 {
        self.target.saturating_sub(self.current)
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Builds the ordered migration chain for Folio.
///
/// ## History
/// | Version | Change                                                   |
/// |---------|----------------------------------------------------------|
/// | 1       | `brokerages(id, name)`                                   |
/// | 2       | `asset_holdings(id, brokerageId, quantity, averageCost)` |
/// | 3       | add `investedValue`, `currentValue`                      |
/// | 4       | drop the four valuation columns                          |
pub fn registry() -> DbResult<Migrator> {
    Migrator::new(vec![
        Migration::new(
            1,
            "create brokerages",
            vec![SchemaOp::CreateTable(TableDef::new(
                BROKERAGES,
                vec![
                    ColumnDef::id("id"),
                    ColumnDef::new("name", SqlType::Text).not_null(),
                ],
            ))],
        ),
        Migration::new(
            2,
            "create asset holdings",
            vec![
                SchemaOp::CreateTable(TableDef::new(
                    ASSET_HOLDINGS,
                    vec![
                        ColumnDef::id("id"),
                        ColumnDef::new("brokerageId", SqlType::Integer)
                            .not_null()
                            .references(BROKERAGES, "id", OnDelete::Restrict),
                        ColumnDef::new("quantity", SqlType::Real),
                        ColumnDef::new("averageCost", SqlType::Real),
                    ],
                )),
                SchemaOp::CreateIndex(IndexDef::new(
                    "idx_asset_holdings_brokerage",
                    ASSET_HOLDINGS,
                    &["brokerageId"],
                )),
            ],
        ),
        Migration::new(
            3,
            "track invested and current value",
            vec![
                SchemaOp::add_column(
                    ASSET_HOLDINGS,
                    ColumnDef::new("investedValue", SqlType::Real),
                ),
                SchemaOp::add_column(
                    ASSET_HOLDINGS,
                    ColumnDef::new("currentValue", SqlType::Real),
                ),
            ],
        ),
        Migration::new(
            4,
            "derive holding valuations",
            vec![SchemaOp::drop_columns(
                ASSET_HOLDINGS,
                &["quantity", "averageCost", "investedValue", "currentValue"],
            )],
        ),
    ])
}

// =============================================================================
// Migrator
// =============================================================================

/// Applies an ordered migration chain to a database.
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<Migration>,
    /// `schemas[v]` is the shape after version `v`; `schemas[0]` is empty.
    schemas: Vec<Schema>,
}

impl Migrator {
    /// Validates the chain and folds the schema at every version.
    ///
    /// Versions must be exactly `1..=N` in order, and every op must fit the
    /// shape produced by the ops before it.
    pub fn new(migrations: Vec<Migration>) -> DbResult<Self> {
        let mut schemas = vec![Schema::default()];

        for (index, migration) in migrations.iter().enumerate() {
            let expected = index as u32 + 1;
            if migration.version != expected {
                return Err(DbError::InvalidMigrationChain(format!(
                    "expected version {expected}, found {} ({})",
                    migration.version, migration.description
                )));
            }
            if migration.ops.is_empty() {
                return Err(DbError::InvalidMigrationChain(format!(
                    "version {expected} has no operations"
                )));
            }

            let mut shape = schemas[index].clone();
            for op in &migration.ops {
                shape = shape.apply(op).map_err(|reason| {
                    DbError::InvalidMigrationChain(format!("version {expected}: {reason}"))
                })?;
            }
            schemas.push(shape);
        }

        Ok(Migrator {
            migrations,
            schemas,
        })
    }

    /// The version reached once every registered migration is applied.
    pub fn target_version(&self) -> u32 {
        self.migrations.len() as u32
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Schema shape after `version` has been applied.
    pub fn schema_at(&self, version: u32) -> Option<&Schema> {
        self.schemas.get(version as usize)
    }

    /// Schema shape at the target version.
    pub fn schema(&self) -> &Schema {
        // `schemas` always holds at least the empty version-0 shape
        &self.schemas[self.schemas.len() - 1]
    }

    /// Reads stored and target versions.
    pub async fn status(&self, pool: &SqlitePool) -> DbResult<MigrationStatus> {
        let mut conn = pool.acquire().await?;
        Ok(MigrationStatus {
            current: read_version(&mut conn).await?,
            target: self.target_version(),
        })
    }

    /// Migrates to the latest registered version.
    pub async fn migrate(&self, pool: &SqlitePool) -> DbResult<MigrationReport> {
        self.migrate_to(pool, self.target_version()).await
    }

    /// Migrates up to `target`, one transaction per step.
    ///
    /// Stops at the first failing step; earlier steps stay committed and
    /// the stored version names the last one that succeeded.
    pub async fn migrate_to(&self, pool: &SqlitePool, target: u32) -> DbResult<MigrationReport> {
        if target > self.target_version() {
            return Err(DbError::migration(
                target,
                format!("no migration registered beyond version {}", self.target_version()),
            ));
        }

        let mut conn = pool.acquire().await?;
        let current = read_version(&mut conn).await?;

        if current > self.target_version() {
            warn!(
                stored = current,
                supported = self.target_version(),
                "Database was written by a newer application"
            );
            return Err(DbError::migration(
                current,
                format!(
                    "database schema version {current} is newer than supported version {}",
                    self.target_version()
                ),
            ));
        }

        if current > target {
            return Err(DbError::migration(
                target,
                format!("cannot downgrade from version {current}"),
            ));
        }

        if current == target {
            debug!(version = current, "Schema is up to date");
            return Ok(MigrationReport {
                from: current,
                to: current,
                applied: Vec::new(),
            });
        }

        info!(from = current, to = target, "Applying pending migrations");

        // Foreign keys cannot be toggled inside a transaction, and table
        // rebuilds would trip them mid-step. Violations are still caught by
        // foreign_key_check before each commit.
        sqlx::query("PRAGMA foreign_keys = OFF")
            .execute(&mut *conn)
            .await?;

        let outcome = self.apply_range(&mut conn, current, target).await;

        let restored = sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&mut *conn)
            .await;

        let applied = outcome?;
        restored?;

        info!(version = target, "All migrations applied successfully");
        Ok(MigrationReport {
            from: current,
            to: target,
            applied,
        })
    }

    async fn apply_range(
        &self,
        conn: &mut SqliteConnection,
        current: u32,
        target: u32,
    ) -> DbResult<Vec<u32>> {
        let mut applied = Vec::new();

        for migration in &self.migrations[current as usize..target as usize] {
            let from = &self.schemas[migration.version as usize - 1];
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );
            apply_step(conn, migration, from).await?;
            applied.push(migration.version);
        }

        Ok(applied)
    }
}

// =============================================================================
// Step Execution
// =============================================================================

/// Applies a single migration inside one transaction.
async fn apply_step(
    conn: &mut SqliteConnection,
    migration: &Migration,
    from: &Schema,
) -> DbResult<()> {
    let version = migration.version;
    let step_err = |e: DbError| match e {
        DbError::MigrationFailed { .. } => e,
        other => DbError::migration(version, other.to_string()),
    };

    // The from-shape check reads before the step writes; hold the write
    // lock for the whole step
    let mut tx = conn
        .begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| step_err(e.into()))?;

    verify_from_shape(&mut *tx, migration, from)
        .await
        .map_err(step_err)?;

    let mut shape = from.clone();
    for op in &migration.ops {
        let next = shape
            .apply(op)
            .map_err(|reason| DbError::migration(version, reason.to_string()))?;

        for statement in op.statements(&next) {
            debug!(version, sql = %statement, "Executing migration statement");
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::migration(version, e.to_string()))?;
        }

        shape = next;
    }

    let violations = sqlx::query("PRAGMA foreign_key_check")
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| DbError::migration(version, e.to_string()))?;
    if let Some(row) = violations.first() {
        let table: String = row
            .try_get(0)
            .map_err(|e| DbError::migration(version, e.to_string()))?;
        return Err(DbError::migration(
            version,
            format!(
                "{} foreign key violation(s), first in table {table}",
                violations.len()
            ),
        ));
    }

    // PRAGMA arguments cannot be bound; the version is an integer we own
    sqlx::query(&format!("PRAGMA user_version = {version}"))
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::migration(version, e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| DbError::migration(version, e.to_string()))?;

    info!(version, "Migration committed");
    Ok(())
}

/// Checks every table and index the step touches against the shape the
/// previous steps should have produced.
async fn verify_from_shape(
    conn: &mut SqliteConnection,
    migration: &Migration,
    from: &Schema,
) -> DbResult<()> {
    let version = migration.version;

    for op in &migration.ops {
        let table = op.table();
        let live = live_columns(conn, table).await?;

        match from.table(table) {
            Some(expected) => {
                let expected = expected.column_names();
                if live != expected {
                    return Err(DbError::migration(
                        version,
                        format!(
                            "table {table} does not match version {}: expected columns {expected:?}, found {live:?}",
                            version - 1
                        ),
                    ));
                }
            }
            None if op_creates_table(op, table) && !live.is_empty() => {
                return Err(DbError::migration(
                    version,
                    format!("table {table} already exists"),
                ));
            }
            None => {}
        }

        if let SchemaOp::CreateIndex(index) = op {
            if live_index_exists(conn, &index.name).await? {
                return Err(DbError::migration(
                    version,
                    format!("index {} already exists", index.name),
                ));
            }
        }
    }

    Ok(())
}

fn op_creates_table(op: &SchemaOp, table: &str) -> bool {
    matches!(op, SchemaOp::CreateTable(def) if def.name == table)
}

/// Reads `PRAGMA user_version`.
pub async fn read_version(conn: &mut SqliteConnection) -> DbResult<u32> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(&mut *conn)
        .await?;

    u32::try_from(version)
        .map_err(|_| DbError::Internal(format!("invalid stored schema version {version}")))
}

/// Runs all pending migrations from the registry.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<MigrationReport> {
    registry()?.migrate(pool).await
}

/// Returns stored and expected schema versions.
///
/// ## Usage
/// For diagnostics and health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    registry()?.status(pool).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_valid_and_matches_schema_version() {
        let migrator = registry().unwrap();
        assert_eq!(migrator.target_version(), SCHEMA_VERSION);
    }

    #[test]
    fn test_registry_schema_history() {
        let migrator = registry().unwrap();

        let v3 = migrator.schema_at(3).unwrap();
        assert_eq!(
            v3.table(ASSET_HOLDINGS).unwrap().column_names(),
            vec![
                "id",
                "brokerageId",
                "quantity",
                "averageCost",
                "investedValue",
                "currentValue"
            ]
        );

        let v4 = migrator.schema();
        assert_eq!(
            v4.table(ASSET_HOLDINGS).unwrap().column_names(),
            vec!["id", "brokerageId"]
        );
        assert_eq!(
            v4.table(BROKERAGES).unwrap().column_names(),
            vec!["id", "name"]
        );
        assert!(v4.index("idx_asset_holdings_brokerage").is_some());
    }

    #[test]
    fn test_chain_must_be_contiguous() {
        let table = |name: &str| {
            SchemaOp::CreateTable(TableDef::new(name, vec![ColumnDef::id("id")]))
        };

        let gap = Migrator::new(vec![
            Migration::new(1, "a", vec![table("a")]),
            Migration::new(3, "c", vec![table("c")]),
        ]);
        assert!(matches!(gap, Err(DbError::InvalidMigrationChain(_))));

        let reordered = Migrator::new(vec![
            Migration::new(2, "b", vec![table("b")]),
            Migration::new(1, "a", vec![table("a")]),
        ]);
        assert!(matches!(reordered, Err(DbError::InvalidMigrationChain(_))));

        let empty_step = Migrator::new(vec![Migration::new(1, "noop", vec![])]);
        assert!(matches!(empty_step, Err(DbError::InvalidMigrationChain(_))));
    }

    #[test]
    fn test_chain_rejects_ops_that_do_not_fit() {
        let result = Migrator::new(vec![Migration::new(
            1,
            "drop from nothing",
            vec![SchemaOp::drop_columns("ghost", &["x"])],
        )]);
        assert!(matches!(result, Err(DbError::InvalidMigrationChain(_))));
    }

    #[test]
    fn test_status_helpers() {
        let status = MigrationStatus {
            current: 1,
            target: 4,
        };
        assert!(!status.is_up_to_date());
        assert_eq!(status.pending(), 3);
    }
}
