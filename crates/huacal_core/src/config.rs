//! Runtime configuration resolved from the process environment.
//!
//! Variables:
//! - `HUACAL_DB_PATH`: entry database file. Defaults to
//!   `<temp dir>/huacal_entries.sqlite3`.
//! - `HUACAL_LOG_LEVEL`: `trace|debug|info|warn|error`. Defaults to
//!   [`default_log_level`].
//!
//! Blank values fall back to the defaults.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "HUACAL_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "HUACAL_LOG_LEVEL";
pub const DEFAULT_DB_FILE_NAME: &str = "huacal_entries.sqlite3";

/// Settings shared by the FFI and CLI entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Reads the configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: non_blank(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
        }
    }

    /// Level to start logging with: `requested` unless blank, otherwise the
    /// configured level.
    pub fn resolve_log_level<'a>(&'a self, requested: &'a str) -> &'a str {
        let requested = requested.trim();
        if requested.is_empty() {
            self.log_level.as_str()
        } else {
            requested
        }
    }
}
