//! Flutter bridge crate for the huacal entry core.

pub mod api;
