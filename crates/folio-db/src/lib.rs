//! # folio-db: Persistence Core for Folio
//!
//! Local SQLite storage for brokerages and asset holdings: schema
//! description, versioned migrations, repositories and the platform-aware
//! database builder.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Folio Data Flow                                  │
//! │                                                                         │
//! │  Application root                                                      │
//! │       │  DatabaseBuilder::new(StorageConfig::load(None)?).build()      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     folio-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   builder     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ config/platf. │    │ brokerage.rs  │    │ registry()   │  │   │
//! │  │   │               │    │ holding.rs    │    │ v1 .. v4     │  │   │
//! │  │   │   Database    │◄───│               │    │ schema.rs    │  │   │
//! │  │   │   (pool.rs)   │    │               │    │ (SchemaOp)   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  folio.db (SQLite, WAL, user_version = schema version)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`builder`] - `DatabaseBuilder::build()`, the only way to get a handle in the app
//! - [`config`] - `StorageConfig` (TOML + environment)
//! - [`platform`] - per-OS data/config directories
//! - [`pool`] - Connection pool and the `Database` handle
//! - [`schema`] - Explicit schema description and declarative ops
//! - [`migrations`] - Ordered migration chain and its runner
//! - [`repository`] - Brokerage and holding repositories
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_core::MandatoryText;
//! use folio_db::{DatabaseBuilder, StorageConfig};
//!
//! let db = DatabaseBuilder::new(StorageConfig::load(None)?).build().await?;
//!
//! let id = db.brokerages().insert(&MandatoryText::new("XYZ Corp")?).await?;
//! db.holdings().insert(id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod builder;
pub mod config;
pub mod error;
pub mod migrations;
pub mod platform;
pub mod pool;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use builder::DatabaseBuilder;
pub use config::StorageConfig;
pub use error::{DbError, DbResult, SchemaError};
pub use migrations::{Migration, MigrationReport, MigrationStatus, Migrator, SCHEMA_VERSION};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::brokerage::BrokerageRepository;
pub use repository::holding::HoldingRepository;
