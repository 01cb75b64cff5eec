//! Entry domain model.
//!
//! # Responsibility
//! - Define the canonical crate-delivery record persisted by the store.
//! - Define the optional filter criteria applied to entry lists.
//! - Provide list-level aggregate projections for the entry screen.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; persisted ids are never reused.
//! - Entry lists are ordered by `date DESC, id ASC`.
//! - Every unset criteria field is a pass-through, never "match nothing".

use serde::{Deserialize, Serialize};

/// Store-assigned entry identifier.
///
/// `UNSAVED_ENTRY_ID` marks records that were never persisted.
pub type EntryId = i64;

/// Identifier carried by entries that have not been persisted yet.
pub const UNSAVED_ENTRY_ID: EntryId = 0;

/// One huacal delivery record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned identifier. Zero until the first upsert.
    pub id: EntryId,
    /// Delivery date as Unix epoch milliseconds.
    pub date: i64,
    /// Client the crates were delivered for.
    pub client_name: String,
    /// Number of crates. Positive for validated entries.
    pub quantity: i64,
    /// Unit price. Finite and non-negative for validated entries.
    pub price: f64,
}

impl Entry {
    /// Creates an unsaved entry.
    pub fn new(date: i64, client_name: impl Into<String>, quantity: i64, price: f64) -> Self {
        Self::with_id(UNSAVED_ENTRY_ID, date, client_name, quantity, price)
    }

    /// Creates an entry with a caller-provided id.
    ///
    /// Used when editing a loaded record; the id must be the stored one.
    pub fn with_id(
        id: EntryId,
        date: i64,
        client_name: impl Into<String>,
        quantity: i64,
        price: f64,
    ) -> Self {
        Self {
            id,
            date,
            client_name: client_name.into(),
            quantity,
            price,
        }
    }

    /// Returns whether the store has assigned an id to this entry.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ENTRY_ID
    }

    /// Amount charged for this delivery (`quantity * price`).
    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// Optional predicates narrowing an entry list.
///
/// Present fields are combined with logical AND. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryCriteria {
    /// Case-insensitive substring of `client_name`. Blank means unset.
    pub client_name: Option<String>,
    /// Lower date bound in epoch milliseconds.
    pub date_from: Option<i64>,
    /// Upper date bound in epoch milliseconds.
    pub date_to: Option<i64>,
    pub quantity_min: Option<i64>,
    pub quantity_max: Option<i64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl EntryCriteria {
    /// Returns the trimmed name needle, or `None` when unset or blank.
    pub fn client_name_needle(&self) -> Option<&str> {
        self.client_name
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
    }

    /// Returns whether no predicate is active.
    pub fn is_unrestricted(&self) -> bool {
        self.client_name_needle().is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.quantity_min.is_none()
            && self.quantity_max.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
    }

    /// Evaluates the criteria against one entry in memory.
    ///
    /// Mirrors the SQL predicate built by the store, including ASCII-only
    /// case folding for the name needle.
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(needle) = self.client_name_needle() {
            let haystack = entry.client_name.to_ascii_lowercase();
            if !haystack.contains(&needle.to_ascii_lowercase()) {
                return false;
            }
        }

        within(entry.date, self.date_from, self.date_to)
            && within(entry.quantity, self.quantity_min, self.quantity_max)
            && within(entry.price, self.price_min, self.price_max)
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// Aggregate shown above the entry list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub count: usize,
    pub total_quantity: i64,
    pub total_amount: f64,
}

impl EntrySummary {
    /// Folds a list of entries into counts and totals.
    pub fn from_entries(entries: &[Entry]) -> Self {
        entries.iter().fold(Self::default(), |mut summary, entry| {
            summary.count += 1;
            summary.total_quantity += entry.quantity;
            summary.total_amount += entry.total();
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Entry, EntryCriteria, EntrySummary};

    #[test]
    fn new_entry_is_unsaved() {
        let entry = Entry::new(1_000, "Juan", 3, 10.0);
        assert!(!entry.is_persisted());
        assert_eq!(entry.total(), 30.0);
    }

    #[test]
    fn blank_name_needle_is_unrestricted() {
        let criteria = EntryCriteria {
            client_name: Some("   ".to_string()),
            ..EntryCriteria::default()
        };
        assert!(criteria.is_unrestricted());
        assert!(criteria.matches(&Entry::new(0, "Pedro", 1, 1.0)));
    }

    #[test]
    fn matches_applies_inclusive_bounds() {
        let criteria = EntryCriteria {
            quantity_min: Some(10),
            quantity_max: Some(20),
            ..EntryCriteria::default()
        };
        assert!(criteria.matches(&Entry::new(0, "Ana", 10, 1.0)));
        assert!(criteria.matches(&Entry::new(0, "Ana", 20, 1.0)));
        assert!(!criteria.matches(&Entry::new(0, "Ana", 9, 1.0)));
        assert!(!criteria.matches(&Entry::new(0, "Ana", 21, 1.0)));
    }

    #[test]
    fn summary_sums_quantity_and_amount() {
        let entries = vec![
            Entry::new(0, "Ana", 2, 5.0),
            Entry::new(0, "Juan", 3, 1.5),
        ];
        let summary = EntrySummary::from_entries(&entries);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_quantity, 5);
        assert!((summary.total_amount - 14.5).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_serializes_with_snake_case_fields() {
        let entry = Entry::with_id(7, 1_700_000_000_000, "Ana", 4, 2.5);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["client_name"], "Ana");
        assert_eq!(json["quantity"], 4);

        let decoded: Entry = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, entry);
    }
}
