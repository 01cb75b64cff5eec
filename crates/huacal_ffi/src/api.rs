//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose entry save/get/delete/list use-cases to Dart via FRB.
//! - Flatten core errors into envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One process-wide store is opened lazily at the configured path.
//! - Validation failures come back per field, never as a generic failure.

use huacal_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, Entry, EntryCriteria, EntryForm, EntryService, EntryServiceError, EntrySummary,
    SqliteEntryRepository,
};
use log::error;
use once_cell::sync::OnceCell;

static ENTRY_STORE: OnceCell<SqliteEntryRepository> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// A blank `level` uses `HUACAL_LOG_LEVEL` (or the build default).
/// Returns an empty string on success and an error message otherwise.
/// Safe to call repeatedly with the same `level + log_dir`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let config = CoreConfig::from_env();
    match init_logging_inner(config.resolve_log_level(&level), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Entry row rendered by the entry list.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryItem {
    pub id: i64,
    pub date_epoch_ms: i64,
    pub client_name: String,
    pub quantity: i64,
    pub price: f64,
    /// `quantity * price`.
    pub total: f64,
}

/// Optional list filter. Unset fields do not restrict the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilterInput {
    pub client_name: Option<String>,
    pub date_from_epoch_ms: Option<i64>,
    pub date_to_epoch_ms: Option<i64>,
    pub quantity_min: Option<i64>,
    pub quantity_max: Option<i64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

/// Save outcome with per-field validation messages.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySaveResponse {
    pub ok: bool,
    /// Stored entry on success.
    pub entry: Option<EntryItem>,
    pub client_name_error: Option<String>,
    pub quantity_error: Option<String>,
    pub price_error: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Single-entry lookup result. `entry` is `None` for unknown ids.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryGetResponse {
    pub ok: bool,
    pub entry: Option<EntryItem>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    pub message: String,
}

/// Entry list with the header aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryListResponse {
    pub ok: bool,
    /// Sorted by date descending, ties by id.
    pub items: Vec<EntryItem>,
    pub count: u32,
    pub total_quantity: i64,
    pub total_amount: f64,
    pub message: String,
}

/// Validates and saves one entry.
///
/// `id = None` (or `0`) creates a new entry; `date_epoch_ms = None` stamps
/// the current time.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_save(
    id: Option<i64>,
    date_epoch_ms: Option<i64>,
    client_name: String,
    quantity: String,
    price: String,
) -> EntrySaveResponse {
    let form = EntryForm {
        id: id.unwrap_or_default(),
        date: date_epoch_ms,
        client_name,
        quantity,
        price,
    };

    match with_entry_service(|service| service.save(&form)) {
        Ok(entry) => EntrySaveResponse {
            ok: true,
            entry: Some(to_entry_item(entry)),
            client_name_error: None,
            quantity_error: None,
            price_error: None,
            message: if form.is_editing() {
                "Entry updated.".to_string()
            } else {
                "Entry saved.".to_string()
            },
        },
        Err(FfiFailure::Service(EntryServiceError::Validation(errors))) => EntrySaveResponse {
            ok: false,
            entry: None,
            client_name_error: errors.client_name.map(|err| err.message().to_string()),
            quantity_error: errors.quantity.map(|err| err.message().to_string()),
            price_error: errors.price.map(|err| err.message().to_string()),
            message: "Please fix the highlighted fields.".to_string(),
        },
        Err(failure) => EntrySaveResponse {
            ok: false,
            entry: None,
            client_name_error: None,
            quantity_error: None,
            price_error: None,
            message: format!("entry_save failed: {failure}"),
        },
    }
}

/// Loads one entry for editing.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_get(id: i64) -> EntryGetResponse {
    match with_entry_service(|service| service.load_by_id(id)) {
        Ok(Some(entry)) => EntryGetResponse {
            ok: true,
            entry: Some(to_entry_item(entry)),
            message: "Entry loaded.".to_string(),
        },
        Ok(None) => EntryGetResponse {
            ok: true,
            entry: None,
            message: format!("Entry {id} not found."),
        },
        Err(failure) => EntryGetResponse {
            ok: false,
            entry: None,
            message: format!("entry_get failed: {failure}"),
        },
    }
}

/// Deletes one entry. Unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete(id: i64) -> EntryActionResponse {
    match with_entry_service(|service| service.delete(id)) {
        Ok(()) => EntryActionResponse {
            ok: true,
            message: "Entry deleted.".to_string(),
        },
        Err(failure) => EntryActionResponse {
            ok: false,
            message: format!("entry_delete failed: {failure}"),
        },
    }
}

/// Lists entries, optionally filtered.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list(filter: Option<EntryFilterInput>) -> EntryListResponse {
    let criteria = filter.map(to_criteria).unwrap_or_default();
    match with_entry_service(|service| service.snapshot(&criteria)) {
        Ok(entries) => {
            let summary = EntrySummary::from_entries(&entries);
            let message = if entries.is_empty() {
                "No entries.".to_string()
            } else {
                format!("Found {} entries.", entries.len())
            };
            EntryListResponse {
                ok: true,
                items: entries.into_iter().map(to_entry_item).collect(),
                count: u32::try_from(summary.count).unwrap_or(u32::MAX),
                total_quantity: summary.total_quantity,
                total_amount: summary.total_amount,
                message,
            }
        }
        Err(failure) => EntryListResponse {
            ok: false,
            items: Vec::new(),
            count: 0,
            total_quantity: 0,
            total_amount: 0.0,
            message: format!("entry_list failed: {failure}"),
        },
    }
}

/// Change counter of the shared store.
///
/// Dart polls this to decide whether `entry_list` must be called again.
/// Returns `0` when the store cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_store_version() -> u64 {
    entry_store().map(|store| store.version()).unwrap_or(0)
}

/// Failure raised before or during a service call.
#[derive(Debug)]
enum FfiFailure {
    StoreUnavailable(String),
    Service(EntryServiceError),
}

impl std::fmt::Display for FfiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(message) => write!(f, "entry store unavailable: {message}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

fn entry_store() -> Result<&'static SqliteEntryRepository, String> {
    ENTRY_STORE.get_or_try_init(|| {
        let config = CoreConfig::from_env();
        SqliteEntryRepository::open(&config.db_path).map_err(|err| {
            error!(
                "event=ffi_store_open module=ffi status=error error_code=store_open_failed error={err}"
            );
            err.to_string()
        })
    })
}

fn with_entry_service<T>(
    f: impl FnOnce(&EntryService<SqliteEntryRepository>) -> Result<T, EntryServiceError>,
) -> Result<T, FfiFailure> {
    let store = entry_store().map_err(FfiFailure::StoreUnavailable)?;
    let service = EntryService::new(store.clone());
    f(&service).map_err(FfiFailure::Service)
}

fn to_criteria(filter: EntryFilterInput) -> EntryCriteria {
    EntryCriteria {
        client_name: filter.client_name,
        date_from: filter.date_from_epoch_ms,
        date_to: filter.date_to_epoch_ms,
        quantity_min: filter.quantity_min,
        quantity_max: filter.quantity_max,
        price_min: filter.price_min,
        price_max: filter.price_max,
    }
}

fn to_entry_item(entry: Entry) -> EntryItem {
    EntryItem {
        total: entry.total(),
        id: entry.id,
        date_epoch_ms: entry.date,
        client_name: entry.client_name,
        quantity: entry.quantity,
        price: entry.price,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, entry_delete, entry_get, entry_list, entry_save, entry_store_version,
        init_logging, ping, EntryFilterInput,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_blank_level_uses_configured_level() {
        // Only the directory is invalid, so a blank level must have resolved.
        let err = init_logging("  ".to_string(), "relative/logs".to_string());
        assert!(err.contains("absolute"), "unexpected error: {err}");
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn entry_save_reports_field_errors() {
        let response = entry_save(None, None, "Zo".to_string(), "-5".to_string(), "abc".to_string());
        assert!(!response.ok);
        assert!(response.entry.is_none());
        assert!(response.client_name_error.is_some());
        assert!(response.quantity_error.is_some());
        assert!(response.price_error.is_some());
    }

    #[test]
    fn entry_save_get_list_delete_flow() {
        let name = unique_name("flow");
        let version_before = entry_store_version();
        let saved = entry_save(None, Some(1_000), name.clone(), "5".to_string(), "10.50".to_string());
        assert!(saved.ok, "{}", saved.message);
        let item = saved.entry.expect("saved entry should be returned");
        assert!(item.id > 0);
        assert_eq!(item.total, 52.5);
        assert!(entry_store_version() > version_before);

        let loaded = entry_get(item.id);
        assert!(loaded.ok, "{}", loaded.message);
        assert_eq!(loaded.entry, Some(item.clone()));

        let listed = entry_list(Some(EntryFilterInput {
            client_name: Some(name.to_uppercase()),
            ..EntryFilterInput::default()
        }));
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.count, 1);
        assert_eq!(listed.items[0].id, item.id);

        let deleted = entry_delete(item.id);
        assert!(deleted.ok, "{}", deleted.message);
        let missing = entry_get(item.id);
        assert!(missing.ok);
        assert!(missing.entry.is_none());
    }

    #[test]
    fn entry_save_with_id_updates_existing_entry() {
        let name = unique_name("update");
        let created = entry_save(None, Some(2_000), name.clone(), "1".to_string(), "1".to_string());
        let id = created.entry.expect("created entry").id;

        let updated = entry_save(Some(id), Some(2_000), name, "7".to_string(), "1".to_string());
        assert!(updated.ok, "{}", updated.message);
        assert_eq!(updated.entry.expect("updated entry").quantity, 7);
        assert_eq!(updated.message, "Entry updated.");

        entry_delete(id);
    }

    fn unique_name(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
