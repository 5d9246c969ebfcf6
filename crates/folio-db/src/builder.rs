//! # Database Builder
//!
//! The single entry point for acquiring a [`Database`] handle.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       DatabaseBuilder::build()                          │
//! │                                                                         │
//! │  1. Resolve Path ─────────────────────────────────────────────────────► │
//! │     • config.database_path, if set                                      │
//! │     • else (config.data_dir | platform data dir) / file_name            │
//! │                                                                         │
//! │  2. Prepare Directory ────────────────────────────────────────────────► │
//! │     • create_dir_all(parent)                                            │
//! │                                                                         │
//! │  3. Open ─────────────────────────────────────────────────────────────► │
//! │     • read/write/create, WAL, foreign keys                              │
//! │                                                                         │
//! │  4. Migrate ──────────────────────────────────────────────────────────► │
//! │     • pending steps, in order, before the handle is returned            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-3 fail with [`DbError::Initialization`], step 4 with
//! [`DbError::MigrationFailed`]. Both are fatal to startup; the caller
//! decides whether to show an error or attempt recovery.

use std::path::PathBuf;
use tracing::info;

use crate::config::StorageConfig;
use crate::error::{DbError, DbResult};
use crate::platform;
use crate::pool::Database;

/// Builds the application's database handle from a [`StorageConfig`].
///
/// ## Example
/// ```rust,ignore
/// let config = StorageConfig::load(None)?;
/// let db = DatabaseBuilder::new(config).build().await?;
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    config: StorageConfig,
}

impl DatabaseBuilder {
    pub fn new(config: StorageConfig) -> Self {
        DatabaseBuilder { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Resolves the database file path without touching the filesystem.
    ///
    /// Deterministic for a given config, platform and user.
    pub fn resolve_path(&self) -> DbResult<PathBuf> {
        if let Some(path) = &self.config.database_path {
            return Ok(path.clone());
        }

        let dir = self
            .config
            .data_dir
            .clone()
            .or_else(platform::data_dir)
            .ok_or_else(|| {
                DbError::Initialization(
                    "no application data directory on this platform; set data_dir".into(),
                )
            })?;

        Ok(dir.join(&self.config.file_name))
    }

    /// Resolves the path, creates missing directories, opens the database
    /// and applies pending migrations.
    pub async fn build(&self) -> DbResult<Database> {
        self.config.validate()?;

        let path = self.resolve_path()?;
        info!(path = %path.display(), "Database path determined");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Initialization(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let db = Database::new(self.config.db_config(path)).await?;
        info!("Database connected and migrations applied");

        Ok(db)
    }
}
