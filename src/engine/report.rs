//! Diagnostic view over one validation run
//!
//! [`ValidationReport`] carries everything a collaborator (e.g. an HTTP
//! layer building a 4xx response) may want to inspect: the raw input
//! snapshot, the resolved values, the collected errors, and the raw keys
//! that matched no declared field. The filter instance itself never holds
//! run state, so one instance serves concurrent requests.

use crate::core::error::{ProjectionError, SiftError, SiftResult, ValidationFailure};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// The full outcome of one validation run
#[derive(Debug, Clone)]
pub struct ValidationReport {
    raw: Map<String, Value>,
    values: IndexMap<String, Value>,
    errors: IndexMap<String, String>,
    unknown: Vec<String>,
}

impl ValidationReport {
    pub(crate) fn new(
        raw: Map<String, Value>,
        values: IndexMap<String, Value>,
        errors: IndexMap<String, String>,
        unknown: Vec<String>,
    ) -> Self {
        Self {
            raw,
            values,
            errors,
            unknown,
        }
    }

    /// Whether the run produced no field or condition errors
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Every collected error, field name → message
    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    /// The message recorded for one field, if any
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// One resolved value (present for every declared field, possibly Null)
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// The resolved mapping, in declaration order
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// One raw input value, as received (unknown keys included)
    pub fn raw_value(&self, field: &str) -> Option<&Value> {
        self.raw.get(field)
    }

    /// The raw input snapshot
    pub fn raw_values(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Raw input keys that matched no declared field
    ///
    /// These never appear in the resolved output; they are kept here for
    /// diagnostics only.
    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown
    }

    /// Consume the report: the resolved mapping, or the aggregate failure
    pub fn into_result(self) -> SiftResult<IndexMap<String, Value>> {
        if self.errors.is_empty() {
            Ok(self.values)
        } else {
            Err(SiftError::Validation(ValidationFailure::new(self.errors)))
        }
    }

    /// Consume the report and project the resolved mapping into a model type
    ///
    /// Validation errors surface first, as the aggregate failure. A mapping
    /// that validated but does not fit the model (missing model field,
    /// Null into a non-optional slot) is a [`ProjectionError`]: a schema
    /// mismatch, distinct from bad user input.
    pub fn into_model<T: DeserializeOwned>(self) -> SiftResult<T> {
        let values = self.into_result()?;
        let object: Map<String, Value> = values.into_iter().collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|e| SiftError::Projection(ProjectionError::from(e)))
    }
}
