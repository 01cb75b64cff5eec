//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the entry data access contract.
//! - Isolate SQLite query details from service orchestration.
//! - Publish table changes to live list subscribers.
//!
//! # Invariants
//! - Lookups report a missing id as `None`, never as an error.
//! - Storage failures surface as `RepoError`, never silently dropped.

pub mod entry_repo;
pub mod entry_watch;
