//! # Database Error Types
//!
//! Error types for storage, migration and initialization.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        ValidationError (folio-core)        │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Application bootstrap / presentation layer                            │
//! │  (decides abort vs. guided recovery; no retries in this crate)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use folio_core::ValidationError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Update or delete by an id that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a brokerage that still has holdings (ON DELETE RESTRICT)
    /// - Inserting a holding for a brokerage id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Storage could not be prepared.
    ///
    /// ## When This Occurs
    /// - No data directory can be resolved on this platform
    /// - The data directory cannot be created
    /// - The database file cannot be opened for read/write
    ///
    /// Fatal to startup.
    #[error("Database initialization failed: {0}")]
    Initialization(String),

    /// A migration step could not be applied.
    ///
    /// ## When This Occurs
    /// - The live schema does not match the step's expected "from" shape
    /// - SQL failure while applying the step
    /// - The file was written by a newer application version
    ///
    /// The step's transaction is rolled back, so the stored schema version
    /// still names the last step that fully succeeded.
    #[error("Migration to version {version} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    /// The registered migration list is not a contiguous `1..=N` chain.
    #[error("Invalid migration chain: {0}")]
    InvalidMigrationChain(String),

    /// Storage configuration could not be loaded or is invalid.
    #[error("Invalid storage configuration: {0}")]
    Config(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Input rejected by a value object.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a MigrationFailed error for the given target version.
    pub fn migration(version: u32, reason: impl Into<String>) -> Self {
        DbError::MigrationFailed {
            version,
            reason: reason.into(),
        }
    }

    /// Returns true for errors that are fatal to application startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DbError::Initialization(_)
                | DbError::MigrationFailed { .. }
                | DbError::InvalidMigrationChain(_)
                | DbError::Config(_)
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "FOREIGN KEY constraint failed"
                if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::Internal("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// A schema operation that does not fit the shape it is applied to.
///
/// Raised by [`crate::schema::Schema::apply`] while a migration chain is
/// folded or a step is executed; callers wrap it into
/// [`DbError::InvalidMigrationChain`] or [`DbError::MigrationFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("table {0} already exists")]
    TableExists(String),

    #[error("table {0} does not exist")]
    TableMissing(String),

    #[error("table {0} would have no columns")]
    NoColumns(String),

    #[error("column {table}.{column} already exists")]
    ColumnExists { table: String, column: String },

    #[error("column {table}.{column} does not exist")]
    ColumnMissing { table: String, column: String },

    /// Primary keys can be neither added to nor dropped from a table.
    #[error("primary key {table}.{column} cannot be added or dropped")]
    PrimaryKey { table: String, column: String },

    #[error("NOT NULL column {table}.{column} needs a default")]
    NotNullWithoutDefault { table: String, column: String },

    #[error("no columns to drop from {0}")]
    NothingToDrop(String),

    #[error("index {0} already exists")]
    IndexExists(String),
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DbError::not_found("Brokerage", 42);
        assert_eq!(err.to_string(), "Brokerage not found: 42");

        let err = DbError::migration(4, "table asset_holdings is missing");
        assert_eq!(
            err.to_string(),
            "Migration to version 4 failed: table asset_holdings is missing"
        );
    }

    #[test]
    fn test_validation_converts_to_db_error() {
        let err: DbError = ValidationError::required("name").into();
        assert!(matches!(err, DbError::Validation(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(DbError::Initialization("disk full".into()).is_fatal());
        assert!(DbError::migration(2, "boom").is_fatal());
        assert!(!DbError::not_found("Brokerage", 1).is_fatal());
        assert!(!DbError::PoolExhausted.is_fatal());
    }
}
