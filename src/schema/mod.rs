//! Schema registry
//!
//! Declarative validation rules for each registration step, and the
//! per-step results they produce.

mod registry;
mod rules;

pub use registry::*;
pub use rules::*;

use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of validating one step. Recomputed on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn errors_for(&self, field: &str) -> Option<&[String]> {
        self.field_errors.get(field).map(Vec::as_slice)
    }

    /// Total number of messages across all fields
    pub fn error_count(&self) -> usize {
        self.field_errors.values().map(Vec::len).sum()
    }
}
