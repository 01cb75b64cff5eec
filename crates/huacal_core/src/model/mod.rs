//! Domain model for huacal delivery entries.
//!
//! # Responsibility
//! - Define canonical data structures used by store, service and editor.
//!
//! # Invariants
//! - Every persisted entry is identified by a stable, never-reused `EntryId`.
//! - Deletion is permanent; there are no tombstones.

pub mod entry;
