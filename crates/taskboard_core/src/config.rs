//! Process configuration for hosts embedding the core.
//!
//! # Responsibility
//! - Hold database and logging settings with usable defaults.
//! - Apply `TASKBOARD_*` environment overrides.
//!
//! # Invariants
//! - Without overrides the core runs on an in-memory database with file
//!   logging disabled.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{init_logging, LogLevel};
use rusqlite::Connection;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TASKBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TASKBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TASKBOARD_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Database file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: LogLevel,
    /// Log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: LogLevel::default_for_build(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level
                .parse()
                .map_err(|err| format!("{ENV_LOG_LEVEL}: {err}"))?;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    /// Starts file logging when a directory is configured.
    ///
    /// Returns whether logging is active.
    pub fn init_logging(&self) -> Result<bool, String> {
        match &self.log_dir {
            Some(dir) => init_logging(self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }

    /// Opens and migrates the configured database.
    pub fn open_database(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}
