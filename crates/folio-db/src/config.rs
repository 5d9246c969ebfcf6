//! # Storage Configuration
//!
//! Where the database lives and how the pool is sized.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FOLIO_DB_PATH=/tmp/dev.db                                          │
//! │     FOLIO_DATA_DIR=/data/folio                                         │
//! │     FOLIO_DB_MAX_CONNECTIONS=2                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/folio/storage.toml (Linux)                               │
//! │     ~/Library/Application Support/com.folio.folio/storage.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     <platform data dir>/folio.db, 5 connections                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storage.toml
//! data_dir = "/srv/folio"        # optional, overrides the platform dir
//! database_path = "/tmp/x.db"    # optional, wins over data_dir + file_name
//! file_name = "folio.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::platform;
use crate::pool::DbConfig;

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "storage.toml";

const ENV_DB_PATH: &str = "FOLIO_DB_PATH";
const ENV_DATA_DIR: &str = "FOLIO_DATA_DIR";
const ENV_MAX_CONNECTIONS: &str = "FOLIO_DB_MAX_CONNECTIONS";

fn default_file_name() -> String {
    platform::DEFAULT_FILE_NAME.to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Storage settings consumed by [`crate::DatabaseBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database. Falls back to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Full path of the database file. Wins over `data_dir` + `file_name`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// File name inside the data directory.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: None,
            database_path: None,
            file_name: default_file_name(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Config rooted at an explicit data directory.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        StorageConfig {
            data_dir: Some(dir.into()),
            ..StorageConfig::default()
        }
    }

    /// Loads configuration from file and environment.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading storage config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file.
    pub fn from_file(path: &Path) -> DbResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| DbError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        if self.file_name.is_empty() {
            return Err(DbError::Config("file_name must not be empty".into()));
        }

        if self.file_name.contains(['/', '\\']) {
            return Err(DbError::Config(format!(
                "file_name must be a bare file name, got {}",
                self.file_name
            )));
        }

        if self.max_connections == 0 {
            return Err(DbError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `FOLIO_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DB_PATH) {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            debug!(dir = %dir, "Overriding data directory from environment");
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(max) = lookup(ENV_MAX_CONNECTIONS) {
            match max.parse::<u32>() {
                Ok(n) => self.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid {}", ENV_MAX_CONNECTIONS),
            }
        }
    }

    /// Busy timeout as a `Duration`.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Pool configuration for a resolved database path.
    pub fn db_config(&self, database_path: PathBuf) -> DbConfig {
        DbConfig::new(database_path)
            .max_connections(self.max_connections)
            .busy_timeout(self.busy_timeout())
    }

    fn default_config_path() -> Option<PathBuf> {
        platform::config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.file_name, "folio.db");
        assert_eq!(config.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = StorageConfig::default();

        config.file_name = String::new();
        assert!(config.validate().is_err());

        config.file_name = "nested/folio.db".into();
        assert!(config.validate().is_err());

        config.file_name = "folio.db".into();
        config.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FOLIO_DB_PATH", "/tmp/override.db"),
            ("FOLIO_DB_MAX_CONNECTIONS", "2"),
        ]);

        let mut config = StorageConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/override.db")));
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn test_invalid_env_number_is_ignored() {
        let mut config = StorageConfig::default();
        config.apply_overrides(|key| (key == "FOLIO_DB_MAX_CONNECTIONS").then(|| "many".into()));
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_toml_partial_file_uses_defaults() {
        let config: StorageConfig = toml::from_str(r#"data_dir = "/srv/folio""#).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/folio")));
        assert_eq!(config.file_name, "folio.db");
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "file_name = \"test.db\"\nmax_connections = 3\n").unwrap();

        let config = StorageConfig::from_file(&path).unwrap();
        assert_eq!(config.file_name, "test.db");
        assert_eq!(config.max_connections, 3);

        std::fs::write(&path, "max_connections = \"three\"").unwrap();
        assert!(matches!(
            StorageConfig::from_file(&path),
            Err(DbError::Config(_))
        ));
    }
}
