//! The validation engine
//!
//! An [`InputFilter`] owns an ordered list of field declarations, global
//! filters/validators applied to every field, and cross-field conditions.
//! It is assembled once through the registration surface and then reused,
//! unchanged, across any number of validation runs: it holds no run
//! state, so `&self` validation is safe from concurrent requests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sift::prelude::*;
//! use sift::{filters, validators};
//!
//! let mut filter = InputFilter::new();
//! filter.add_field(FieldSpec::new("name").required().filter(filters::trim()))?;
//! filter.add_field(
//!     FieldSpec::new("price")
//!         .required()
//!         .filter(filters::to_float())
//!         .validator(validators::is_float()),
//! )?;
//!
//! let values = filter.validate(&payload).await?;
//! ```

pub mod processor;
pub mod report;

pub use report::ValidationReport;

use crate::core::condition::Condition;
use crate::core::error::{ConfigurationError, SiftResult};
use crate::core::field::FieldSpec;
use crate::core::filter::Filter;
use crate::core::validator::Validator;
use crate::external::ExternalApiCaller;
use indexmap::IndexMap;
use processor::FieldProcessor;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A declarative input filter: ordered fields, global plugins, conditions
pub struct InputFilter {
    pub(crate) fields: Vec<FieldSpec>,
    pub(crate) global_filters: Vec<Arc<dyn Filter>>,
    pub(crate) global_validators: Vec<Arc<dyn Validator>>,
    pub(crate) conditions: Vec<Box<dyn Condition>>,
    pub(crate) parallel_enrichment: bool,
    pub(crate) caller: ExternalApiCaller,
}

impl InputFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            global_filters: Vec::new(),
            global_validators: Vec::new(),
            conditions: Vec::new(),
            parallel_enrichment: false,
            caller: ExternalApiCaller::new(),
        }
    }

    // =========================================================================
    // Registration surface
    // =========================================================================

    /// Register a field; declaration order is the resolution order
    ///
    /// Copy-from and computed fields may only reference fields declared
    /// before them. This is an ordering contract, not a dependency solver.
    pub fn add_field(&mut self, spec: FieldSpec) -> SiftResult<()> {
        if self.has_field(spec.name()) {
            return Err(ConfigurationError::DuplicateField {
                name: spec.name().to_string(),
            }
            .into());
        }
        self.fields.push(spec);
        Ok(())
    }

    /// Remove a registered field, returning its spec
    pub fn remove_field(&mut self, name: &str) -> SiftResult<FieldSpec> {
        match self.fields.iter().position(|spec| spec.name() == name) {
            Some(index) => Ok(self.fields.remove(index)),
            None => Err(ConfigurationError::UnknownField {
                name: name.to_string(),
            }
            .into()),
        }
    }

    /// Replace a registered field in place, keeping its declared position
    pub fn replace_field(&mut self, spec: FieldSpec) -> SiftResult<()> {
        match self
            .fields
            .iter()
            .position(|existing| existing.name() == spec.name())
        {
            Some(index) => {
                self.fields[index] = spec;
                Ok(())
            }
            None => Err(ConfigurationError::UnknownField {
                name: spec.name().to_string(),
            }
            .into()),
        }
    }

    /// Register a cross-field condition (evaluated in registration order)
    pub fn add_condition(&mut self, condition: impl Condition + 'static) {
        self.conditions.push(Box::new(condition));
    }

    /// Register a filter applied to every field, after its own filters
    pub fn add_global_filter(&mut self, filter: impl Filter + 'static) {
        self.global_filters.push(Arc::new(filter));
    }

    /// Register a validator applied to every field, after its own validators
    pub fn add_global_validator(&mut self, validator: impl Validator + 'static) {
        self.global_validators.push(Arc::new(validator));
    }

    /// Issue async-mode enrichment calls as one ordered concurrent batch
    ///
    /// The batch fires when the first async enrichment field is reached;
    /// its placeholders substitute from data resolved up to that point. An
    /// enrichment field whose URL references another enrichment field's
    /// result should keep the default sequential path.
    pub fn parallel_enrichment(&mut self, enabled: bool) {
        self.parallel_enrichment = enabled;
    }

    /// Absorb another filter's fields, globals, and conditions
    ///
    /// On field-name collision the merged-in definition wins, replacing the
    /// existing spec in place (original declared position kept); new fields
    /// are appended. Global filters, global validators, and conditions are
    /// concatenated, never deduplicated.
    pub fn merge(&mut self, other: InputFilter) {
        for spec in other.fields {
            match self
                .fields
                .iter()
                .position(|existing| existing.name() == spec.name())
            {
                Some(index) => self.fields[index] = spec,
                None => self.fields.push(spec),
            }
        }
        self.global_filters.extend(other.global_filters);
        self.global_validators.extend(other.global_validators);
        self.conditions.extend(other.conditions);
    }

    /// Whether a field with this name is registered
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|spec| spec.name() == name)
    }

    /// The registered field specs, in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    // =========================================================================
    // Validation entry points
    // =========================================================================

    /// Validate a raw input mapping, producing the full diagnostic report
    ///
    /// Never fails: use this when the caller wants to inspect errors, raw
    /// values, or unknown keys without matching on an error type.
    pub async fn inspect(&self, input: &Map<String, Value>) -> ValidationReport {
        let outcome = FieldProcessor::new(self).run(input).await;
        ValidationReport::new(input.clone(), outcome.values, outcome.errors, outcome.unknown)
    }

    /// Validate a raw input mapping
    ///
    /// Returns the resolved mapping (declared fields only, in declaration
    /// order), or the aggregate failure carrying every field and condition
    /// error from the run.
    pub async fn validate(&self, input: &Map<String, Value>) -> SiftResult<IndexMap<String, Value>> {
        self.inspect(input).await.into_result()
    }

    /// Validate and project the resolved mapping into a model type
    pub async fn validate_into<T: DeserializeOwned>(
        &self,
        input: &Map<String, Value>,
    ) -> SiftResult<T> {
        self.inspect(input).await.into_model()
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InputFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFilter")
            .field("fields", &self.fields)
            .field("global_filters", &self.global_filters.len())
            .field("global_validators", &self.global_validators.len())
            .field("conditions", &self.conditions.len())
            .field("parallel_enrichment", &self.parallel_enrichment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SiftError;

    #[test]
    fn test_add_field_rejects_duplicates() {
        let mut filter = InputFilter::new();
        filter.add_field(FieldSpec::new("name")).unwrap();
        match filter.add_field(FieldSpec::new("name")) {
            Err(SiftError::Configuration(err)) => {
                assert_eq!(err.error_code(), "DUPLICATE_FIELD");
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_field_unknown_name() {
        let mut filter = InputFilter::new();
        match filter.remove_field("ghost") {
            Err(SiftError::Configuration(err)) => {
                assert_eq!(err.error_code(), "UNKNOWN_FIELD");
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_then_re_add() {
        let mut filter = InputFilter::new();
        filter.add_field(FieldSpec::new("name")).unwrap();
        let spec = filter.remove_field("name").unwrap();
        assert_eq!(spec.name(), "name");
        assert!(!filter.has_field("name"));
        filter.add_field(FieldSpec::new("name")).unwrap();
        assert!(filter.has_field("name"));
    }

    #[test]
    fn test_replace_field_keeps_position() {
        let mut filter = InputFilter::new();
        filter.add_field(FieldSpec::new("a")).unwrap();
        filter.add_field(FieldSpec::new("b")).unwrap();
        filter.add_field(FieldSpec::new("c")).unwrap();
        filter.replace_field(FieldSpec::new("b").required()).unwrap();
        let names: Vec<&str> = filter.fields().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(filter.fields()[1].is_required());
    }

    #[test]
    fn test_replace_field_unknown_name() {
        let mut filter = InputFilter::new();
        assert!(filter.replace_field(FieldSpec::new("ghost")).is_err());
    }
}
