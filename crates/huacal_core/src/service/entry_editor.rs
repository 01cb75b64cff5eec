//! Entry editor state machine driven by the entry screen.
//!
//! # Responsibility
//! - Turn UI events into service calls and an observable UI state.
//! - Keep the visible entry list in sync with the live store subscription.
//!
//! # Invariants
//! - Phases move `Idle -> Editing -> {Saved | ValidationFailed}`.
//! - Deleting the entry being edited lands in `Idle` with an empty form;
//!   deleting any other row leaves the form and phase untouched.
//! - Storage failures keep the form intact so the user can retry.
//! - Field errors are cleared as soon as the offending field is edited.

use crate::model::entry::{Entry, EntryCriteria, EntryId, EntrySummary};
use crate::repo::entry_repo::{EntryRepository, RepoResult};
use crate::repo::entry_watch::EntryListWatch;
use crate::service::entry_service::{EntryForm, EntryService, EntryServiceError, FieldErrors};

/// Coarse editor lifecycle exposed to the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorPhase {
    /// Empty form, nothing pending.
    #[default]
    Idle,
    /// Form being filled, either new (`form.id == 0`) or loaded by id.
    Editing,
    /// Last save attempt was rejected; field errors are set.
    ValidationFailed,
    /// Last save succeeded; form was reset.
    Saved,
}

/// Intents emitted by the entry screen.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ClientNameChanged(String),
    QuantityChanged(String),
    PriceChanged(String),
    DateChanged(i64),
    SelectEntry(EntryId),
    Save,
    ClearForm,
    DeleteEntry(EntryId),
    ApplyFilter(EntryCriteria),
    ClearFilter,
}

/// Snapshot rendered by the entry screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorUiState {
    pub form: EntryForm,
    pub field_errors: FieldErrors,
    pub phase: EditorPhase,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
    pub entries: Vec<Entry>,
    pub summary: EntrySummary,
    pub criteria: EntryCriteria,
}

impl EditorUiState {
    /// Whether the form edits an existing entry.
    pub fn is_editing(&self) -> bool {
        self.form.is_editing()
    }

    fn reset_form(&mut self) {
        self.form = EntryForm::default();
        self.field_errors = FieldErrors::default();
    }

    fn start_editing(&mut self) {
        self.phase = EditorPhase::Editing;
        self.success_message = None;
    }
}

/// View-model style coordinator between UI events and the entry service.
pub struct EntryEditor<R: EntryRepository + Clone> {
    service: EntryService<R>,
    state: EditorUiState,
    entries: EntryListWatch<R>,
}

impl<R: EntryRepository + Clone> EntryEditor<R> {
    /// Creates an editor and loads the initial entry list.
    pub fn new(service: EntryService<R>) -> Self {
        let entries = service.list();
        let mut editor = Self {
            service,
            state: EditorUiState::default(),
            entries,
        };
        editor.refresh_entries();
        editor
    }

    pub fn state(&self) -> &EditorUiState {
        &self.state
    }

    pub fn service(&self) -> &EntryService<R> {
        &self.service
    }

    /// Applies one UI event and returns the resulting state.
    pub fn on_event(&mut self, event: EditorEvent) -> &EditorUiState {
        match event {
            EditorEvent::ClientNameChanged(value) => {
                self.state.form.client_name = value;
                self.state.field_errors.client_name = None;
                self.state.start_editing();
            }
            EditorEvent::QuantityChanged(value) => {
                self.state.form.quantity = value;
                self.state.field_errors.quantity = None;
                self.state.start_editing();
            }
            EditorEvent::PriceChanged(value) => {
                self.state.form.price = value;
                self.state.field_errors.price = None;
                self.state.start_editing();
            }
            EditorEvent::DateChanged(date) => {
                self.state.form.date = Some(date);
                self.state.start_editing();
            }
            EditorEvent::SelectEntry(id) => self.select_entry(id),
            EditorEvent::Save => self.save(),
            EditorEvent::ClearForm => {
                self.state.reset_form();
                self.state.phase = EditorPhase::Idle;
                self.state.success_message = None;
                self.state.error_message = None;
            }
            EditorEvent::DeleteEntry(id) => self.delete(id),
            EditorEvent::ApplyFilter(criteria) => self.set_criteria(criteria),
            EditorEvent::ClearFilter => self.set_criteria(EntryCriteria::default()),
        }

        self.refresh_entries();
        &self.state
    }

    /// Waits until the entry list changes and returns the updated state.
    ///
    /// Picks up writes made through other handles on the same store.
    pub async fn next_entries(&mut self) -> Option<&EditorUiState> {
        let result = self.entries.next().await?;
        self.apply_entries(result);
        Some(&self.state)
    }

    fn select_entry(&mut self, id: EntryId) {
        match self.service.load_by_id(id) {
            Ok(Some(entry)) => {
                self.state.form = EntryForm::from_entry(&entry);
                self.state.field_errors = FieldErrors::default();
                self.state.error_message = None;
                self.state.start_editing();
            }
            Ok(None) => {
                self.state.error_message = Some(format!("Entry {id} no longer exists"));
            }
            Err(err) => {
                self.state.error_message = Some(format!("Could not load entry: {err}"));
            }
        }
    }

    fn save(&mut self) {
        let was_editing = self.state.is_editing();
        match self.service.save(&self.state.form) {
            Ok(_) => {
                self.state.reset_form();
                self.state.phase = EditorPhase::Saved;
                self.state.error_message = None;
                self.state.success_message = Some(if was_editing {
                    "Entry updated".to_string()
                } else {
                    "Entry saved".to_string()
                });
            }
            Err(EntryServiceError::Validation(errors)) => {
                self.state.field_errors = errors;
                self.state.phase = EditorPhase::ValidationFailed;
                self.state.success_message = None;
                self.state.error_message = None;
            }
            Err(err) => {
                self.state.phase = EditorPhase::Editing;
                self.state.success_message = None;
                self.state.error_message = Some(format!("Could not save entry: {err}"));
            }
        }
    }

    fn delete(&mut self, id: EntryId) {
        match self.service.delete(id) {
            Ok(()) => {
                if self.state.is_editing() && self.state.form.id == id {
                    self.state.reset_form();
                    self.state.phase = EditorPhase::Idle;
                }
                self.state.error_message = None;
                self.state.success_message = Some("Entry deleted".to_string());
            }
            Err(err) => {
                self.state.error_message = Some(format!("Could not delete entry: {err}"));
            }
        }
    }

    fn set_criteria(&mut self, criteria: EntryCriteria) {
        self.entries = self.service.list_filtered(criteria.clone());
        self.state.criteria = criteria;
    }

    fn refresh_entries(&mut self) {
        if let Some(result) = self.entries.poll_changed() {
            self.apply_entries(result);
        }
    }

    fn apply_entries(&mut self, result: RepoResult<Vec<Entry>>) {
        match result {
            Ok(entries) => {
                self.state.summary = EntrySummary::from_entries(&entries);
                self.state.entries = entries;
            }
            Err(err) => {
                self.state.error_message = Some(format!("Could not load entries: {err}"));
            }
        }
    }
}
