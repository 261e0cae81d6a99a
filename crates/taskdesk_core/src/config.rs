//! Core runtime configuration.
//!
//! Settings come from `TASKDESK_*` environment variables. Resolution goes
//! through a key lookup closure so callers and tests can supply their own
//! source.

use crate::db::{open_db, DbResult};
use crate::logging::{self, default_log_level, LoggingError};
use rusqlite::Connection;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "TASKDESK_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "TASKDESK_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "TASKDESK_LOG_DIR";

pub const DEFAULT_DB_FILE: &str = "taskdesk.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    /// Normalized level name (`trace` .. `error`).
    pub log_level: &'static str,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings from `lookup`; blank values count as unset.
    ///
    /// # Errors
    /// Returns `LoggingError::UnknownLevel` for an unrecognized log level.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(DB_PATH_VAR) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(level) = value(LOG_LEVEL_VAR) {
            config.log_level = logging::parse_level(&level)?;
        }
        config.log_dir = value(LOG_DIR_VAR).map(PathBuf::from);
        Ok(config)
    }

    /// Opens and migrates the configured database file.
    pub fn open_database(&self) -> DbResult<Connection> {
        open_db(&self.database_path)
    }

    /// Starts file logging when a directory is configured.
    ///
    /// Returns `Ok(false)` when logging is disabled.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(dir) => logging::init_logging(self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}
