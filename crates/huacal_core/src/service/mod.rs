//! Core use-case services.
//!
//! # Responsibility
//! - Validate input and orchestrate repository calls.
//! - Drive the entry editor state machine for the UI layer.

pub mod entry_editor;
pub mod entry_service;
