//! Entry use-case service.
//!
//! # Responsibility
//! - Validate string-typed form input field by field.
//! - Map between the form representation and the typed `Entry`.
//! - Expose the save/load/delete/list entry points used by presentation code.
//!
//! # Invariants
//! - Invalid input never reaches the repository.
//! - Storage errors are returned unchanged inside `EntryServiceError::Repo`.
//! - Client names are never written to logs.

use crate::model::entry::{Entry, EntryCriteria, EntryId, UNSAVED_ENTRY_ID};
use crate::repo::entry_repo::{EntryRepository, RepoError};
use crate::repo::entry_watch::EntryListWatch;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Minimum client name length, counted in characters after trimming.
pub const CLIENT_NAME_MIN_CHARS: usize = 3;

/// Raw editor input before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryForm {
    /// `0` for a new entry, the stored id when editing.
    pub id: EntryId,
    /// Delivery date in epoch milliseconds; `None` stamps the save time.
    pub date: Option<i64>,
    pub client_name: String,
    pub quantity: String,
    pub price: String,
}

impl EntryForm {
    /// Fills a form from a stored entry for editing.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            date: Some(entry.date),
            client_name: entry.client_name.clone(),
            quantity: entry.quantity.to_string(),
            price: entry.price.to_string(),
        }
    }

    /// Returns whether the form targets an existing entry.
    pub fn is_editing(&self) -> bool {
        self.id != UNSAVED_ENTRY_ID
    }

    /// Validates every field and maps the form to a typed entry.
    ///
    /// `now_epoch_ms` is used when the form carries no date.
    pub fn to_entry(&self, now_epoch_ms: i64) -> Result<Entry, FieldErrors> {
        let client_name = validate_client_name(&self.client_name);
        let quantity = validate_quantity(&self.quantity);
        let price = validate_price(&self.price);

        match (client_name, quantity, price) {
            (Ok(client_name), Ok(quantity), Ok(price)) => Ok(Entry::with_id(
                self.id,
                self.date.unwrap_or(now_epoch_ms),
                client_name,
                quantity,
                price,
            )),
            (client_name, quantity, price) => Err(FieldErrors {
                client_name: client_name.err(),
                quantity: quantity.err(),
                price: price.err(),
            }),
        }
    }
}

/// One user-correctable problem with a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    NameTooShort,
    QuantityNotANumber,
    QuantityNotPositive,
    InvalidPrice,
}

impl FieldError {
    /// Message shown next to the offending input.
    pub fn message(self) -> &'static str {
        match self {
            Self::NameTooShort => "Client name must have at least 3 characters",
            Self::QuantityNotANumber => "Quantity must be a whole number",
            Self::QuantityNotPositive => "Quantity must be greater than zero",
            Self::InvalidPrice => "Price must be a valid non-negative number",
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Per-field validation outcome. At least one field is set when returned
/// as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    pub client_name: Option<FieldError>,
    pub quantity: Option<FieldError>,
    pub price: Option<FieldError>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.client_name.is_none() && self.quantity.is_none() && self.price.is_none()
    }

    /// Names of the rejected fields, for metadata-only logging.
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("client_name", self.client_name),
            ("quantity", self.quantity),
            ("price", self.price),
        ]
        .into_iter()
        .filter_map(|(name, error)| error.map(|_| name))
        .collect()
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = [self.client_name, self.quantity, self.price]
            .into_iter()
            .flatten()
            .map(FieldError::message)
            .collect::<Vec<_>>();
        write!(f, "invalid entry: {}", messages.join("; "))
    }
}

impl Error for FieldErrors {}

/// Service error for entry use-cases.
#[derive(Debug)]
pub enum EntryServiceError {
    /// Input rejected before reaching storage.
    Validation(FieldErrors),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for EntryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent entry state: {details}"),
        }
    }
}

impl Error for EntryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Repo(err) => Some(err),
            Self::InconsistentState(_) => None,
        }
    }
}

impl From<RepoError> for EntryServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<FieldErrors> for EntryServiceError {
    fn from(value: FieldErrors) -> Self {
        Self::Validation(value)
    }
}

/// Entry service facade over repository implementations.
pub struct EntryService<R: EntryRepository> {
    repo: R,
}

impl<R: EntryRepository> EntryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrow of the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Validates and persists one entry, returning the stored record.
    ///
    /// # Errors
    /// - `Validation` with every rejected field; storage is not touched.
    /// - `Repo` when the upsert or read-back fails.
    pub fn save(&self, form: &EntryForm) -> Result<Entry, EntryServiceError> {
        let entry = match form.to_entry(now_epoch_ms()) {
            Ok(entry) => entry,
            Err(errors) => {
                warn!(
                    "event=entry_save module=service status=rejected entry_id={} fields={}",
                    form.id,
                    errors.field_names().join(",")
                );
                return Err(errors.into());
            }
        };

        let id = self.repo.upsert(&entry)?;
        let stored = self
            .repo
            .get_by_id(id)?
            .ok_or(EntryServiceError::InconsistentState(
                "saved entry not found in read-back",
            ))?;

        info!(
            "event=entry_save module=service status=ok entry_id={} mode={}",
            stored.id,
            if form.is_editing() { "update" } else { "create" }
        );
        Ok(stored)
    }

    /// Loads one entry; `None` when the id is unknown.
    pub fn load_by_id(&self, id: EntryId) -> Result<Option<Entry>, EntryServiceError> {
        Ok(self.repo.get_by_id(id)?)
    }

    /// Deletes one entry by id. Unknown ids are a no-op.
    pub fn delete(&self, id: EntryId) -> Result<(), EntryServiceError> {
        match self.repo.get_by_id(id)? {
            Some(entry) => {
                self.repo.delete(&entry)?;
                info!("event=entry_delete module=service status=ok entry_id={id}");
            }
            None => {
                info!("event=entry_delete module=service status=skipped entry_id={id} reason=not_found");
            }
        }
        Ok(())
    }

    /// One-shot list read with the given criteria.
    pub fn snapshot(&self, criteria: &EntryCriteria) -> Result<Vec<Entry>, EntryServiceError> {
        let entries = if criteria.is_unrestricted() {
            self.repo.list_all()?
        } else {
            self.repo.list_filtered(criteria)?
        };
        Ok(entries)
    }
}

impl<R: EntryRepository + Clone> EntryService<R> {
    /// Live list of all entries, newest date first.
    pub fn list(&self) -> EntryListWatch<R> {
        self.repo.watch_all()
    }

    /// Live list narrowed by `criteria`.
    pub fn list_filtered(&self, criteria: EntryCriteria) -> EntryListWatch<R> {
        self.repo.watch_filtered(criteria)
    }
}

fn validate_client_name(raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < CLIENT_NAME_MIN_CHARS {
        return Err(FieldError::NameTooShort);
    }
    Ok(trimmed.to_string())
}

fn validate_quantity(raw: &str) -> Result<i64, FieldError> {
    let quantity = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| FieldError::QuantityNotANumber)?;
    if quantity <= 0 {
        return Err(FieldError::QuantityNotPositive);
    }
    Ok(quantity)
}

fn validate_price(raw: &str) -> Result<f64, FieldError> {
    let price = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| FieldError::InvalidPrice)?;
    if !price.is_finite() || price < 0.0 {
        return Err(FieldError::InvalidPrice);
    }
    // -0.0 parses as valid; store it as plain zero.
    Ok(price + 0.0)
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
