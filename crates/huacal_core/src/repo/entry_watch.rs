//! Live entry list subscriptions.
//!
//! # Responsibility
//! - Publish a monotonically increasing table version after every write.
//! - Re-deliver filtered entry lists to subscribers when the version moves.
//!
//! # Invariants
//! - A subscriber never misses a write: the version is marked seen before
//!   the list is re-queried, so a write racing the query triggers one more
//!   delivery instead of being lost.
//! - Writes between two reads coalesce into a single delivery.
//! - Dropping an `EntryListWatch` ends the subscription.

use crate::model::entry::{Entry, EntryCriteria};
use crate::repo::entry_repo::{EntryRepository, RepoResult};
use std::sync::Arc;
use tokio::sync::watch;

/// Shared version counter bumped by the store after each effective write.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: Arc<watch::Sender<u64>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Marks the table as changed and wakes every subscriber.
    pub fn publish(&self) {
        self.sender
            .send_modify(|version| *version = version.wrapping_add(1));
    }

    /// Returns a receiver positioned at the current version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }

    /// Current table version.
    pub fn version(&self) -> u64 {
        *self.sender.borrow()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Long-lived observer of an entry list.
///
/// The first read delivers the current list. Later reads deliver again only
/// after a write touched the table.
pub struct EntryListWatch<R: EntryRepository> {
    repo: R,
    criteria: EntryCriteria,
    changes: watch::Receiver<u64>,
    delivered: bool,
}

impl<R: EntryRepository> EntryListWatch<R> {
    pub(crate) fn new(repo: R, criteria: EntryCriteria) -> Self {
        let changes = repo.subscribe_changes();
        Self {
            repo,
            criteria,
            changes,
            delivered: false,
        }
    }

    /// Criteria this watch re-queries with.
    pub fn criteria(&self) -> &EntryCriteria {
        &self.criteria
    }

    /// Waits for the next list delivery.
    ///
    /// Returns `None` only when the repository drops the sender behind
    /// [`EntryRepository::subscribe_changes`]. The SQLite repository owns its
    /// sender, so a watch over it yields until the watch itself is dropped.
    pub async fn next(&mut self) -> Option<RepoResult<Vec<Entry>>> {
        if self.delivered && self.changes.changed().await.is_err() {
            return None;
        }
        Some(self.deliver())
    }

    /// Non-blocking variant of [`next`](Self::next).
    ///
    /// Returns a fresh list when nothing was delivered yet or the table
    /// changed since the last delivery, `None` otherwise.
    pub fn poll_changed(&mut self) -> Option<RepoResult<Vec<Entry>>> {
        let pending = !self.delivered || self.changes.has_changed().unwrap_or(false);
        if !pending {
            return None;
        }
        Some(self.deliver())
    }

    fn deliver(&mut self) -> RepoResult<Vec<Entry>> {
        self.delivered = true;
        let _seen = *self.changes.borrow_and_update();
        if self.criteria.is_unrestricted() {
            self.repo.list_all()
        } else {
            self.repo.list_filtered(&self.criteria)
        }
    }
}
