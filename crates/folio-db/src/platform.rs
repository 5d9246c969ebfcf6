//! # Platform Directories
//!
//! Where Folio keeps its files on each target. Selected at compile time.
//!
//! | Target            | Data directory                                         |
//! |-------------------|--------------------------------------------------------|
//! | Linux             | `~/.local/share/folio`                                 |
//! | macOS             | `~/Library/Application Support/com.folio.folio`        |
//! | Windows           | `%APPDATA%\folio\folio\data`                           |
//! | Android / iOS     | none; the host app passes its sandbox dir in config    |

use std::path::PathBuf;

/// Reverse-DNS qualifier, organisation and application used for paths.
pub const QUALIFIER: &str = "com";
pub const ORGANIZATION: &str = "folio";
pub const APPLICATION: &str = "folio";

/// Default database file name inside the data directory.
pub const DEFAULT_FILE_NAME: &str = "folio.db";

#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod imp {
    use directories::ProjectDirs;
    use std::path::PathBuf;

    use super::{APPLICATION, ORGANIZATION, QUALIFIER};

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
    }

    pub fn data_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    pub fn config_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }
}

#[cfg(any(target_os = "android", target_os = "ios"))]
mod imp {
    use std::path::PathBuf;

    // Sandboxed apps learn their files directory from the OS at runtime
    pub fn data_dir() -> Option<PathBuf> {
        None
    }

    pub fn config_dir() -> Option<PathBuf> {
        None
    }
}

/// Per-user application data directory, if this platform has a fixed one.
pub fn data_dir() -> Option<PathBuf> {
    imp::data_dir()
}

/// Per-user configuration directory, if this platform has a fixed one.
pub fn config_dir() -> Option<PathBuf> {
    imp::config_dir()
}
