//! Core domain logic for huacal delivery entries.
//! This crate is the single source of truth for entry storage and validation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{Entry, EntryCriteria, EntryId, EntrySummary, UNSAVED_ENTRY_ID};
pub use repo::entry_repo::{EntryRepository, RepoError, RepoResult, SqliteEntryRepository};
pub use repo::entry_watch::EntryListWatch;
pub use service::entry_editor::{EditorEvent, EditorPhase, EditorUiState, EntryEditor};
pub use service::entry_service::{
    EntryForm, EntryService, EntryServiceError, FieldError, FieldErrors,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
