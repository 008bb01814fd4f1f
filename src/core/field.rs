//! Field declarations
//!
//! A [`FieldSpec`] is one field's full declaration: required-ness, default,
//! fallback, ordered filters and validators (or a unified [`Step`]
//! sequence), and at most one alternative value source: copy-from,
//! computed, nested sub-pipeline, or external-API enrichment.

use crate::core::filter::Filter;
use crate::core::validator::Validator;
use crate::engine::InputFilter;
use crate::external::ExternalApiConfig;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Closure type for computed fields
///
/// Receives the mapping resolved so far (declaration order decides what is
/// visible) and produces the field's value. An `Err` is logged and the
/// field resolves to `Null`; it never fails the run.
pub type ComputedFn = dyn Fn(&IndexMap<String, Value>) -> anyhow::Result<Value> + Send + Sync;

/// One entry of a unified filter/validator sequence
///
/// `steps` is an alternative declaration style to separate `filters` and
/// `validators` lists: entries run in declared order, and the first
/// validator rejection stops the field's chain exactly as in the split
/// style.
pub enum Step {
    Filter(Arc<dyn Filter>),
    Validator(Arc<dyn Validator>),
}

/// One field's complete declaration
///
/// Built once through the consuming builder, then immutable for the
/// lifetime of the owning [`InputFilter`]. Exactly one of {ordinary input,
/// `copy_from`, `computed`, `nested`, `external_api`} drives the field's
/// primary value source; filters and validators still apply afterward,
/// except for computed fields which bypass the chain entirely.
///
/// # Example
///
/// ```ignore
/// let spec = FieldSpec::new("price")
///     .required()
///     .filter(filters::to_float())
///     .validator(validators::is_float());
/// ```
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) fallback: Option<Value>,
    pub(crate) filters: Vec<Arc<dyn Filter>>,
    pub(crate) validators: Vec<Arc<dyn Validator>>,
    pub(crate) steps: Vec<Step>,
    pub(crate) external_api: Option<ExternalApiConfig>,
    pub(crate) copy_from: Option<String>,
    pub(crate) computed: Option<Arc<ComputedFn>>,
    pub(crate) nested: Option<Box<InputFilter>>,
}

impl FieldSpec {
    /// Start declaring a field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: None,
            fallback: None,
            filters: Vec::new(),
            validators: Vec::new(),
            steps: Vec::new(),
            external_api: None,
            copy_from: None,
            computed: None,
            nested: None,
        }
    }

    /// Mark the field as required
    ///
    /// A required field with no value, default, or fallback records exactly
    /// "Field '<name>' is required." in the aggregate failure.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value used when the field is absent from raw input
    ///
    /// Defaults are trusted as-is: filtering and validation are skipped.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Value substituted when filtering/validation fails
    ///
    /// A fallback suppresses the field's error and satisfies required-ness;
    /// the fallback value itself is never re-validated.
    pub fn fallback(mut self, value: Value) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Append a filter to the field's ordered filter chain
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append a validator to the field's ordered validation chain
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Append a filter entry to the unified step sequence
    ///
    /// A non-empty step sequence replaces the field's separate
    /// filter/validator lists; global filters and validators still apply
    /// after it.
    pub fn step_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.steps.push(Step::Filter(Arc::new(filter)));
        self
    }

    /// Append a validator entry to the unified step sequence
    pub fn step_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.steps.push(Step::Validator(Arc::new(validator)));
        self
    }

    /// Resolve this field by calling an external HTTP API
    ///
    /// The call is the field's value source: raw input under this name is
    /// ignored and the default shortcut never suppresses the call. On
    /// failure the fallback applies if declared, otherwise the field errors.
    pub fn external_api(mut self, config: ExternalApiConfig) -> Self {
        self.external_api = Some(config);
        self
    }

    /// Duplicate the resolved value of another (earlier-declared) field
    ///
    /// The copy is taken post-filter from the source field, then runs this
    /// field's own chain independently. Copying from a field declared later
    /// observes whatever the resolved mapping holds at that point (nothing).
    pub fn copy_from(mut self, source: impl Into<String>) -> Self {
        self.copy_from = Some(source.into());
        self
    }

    /// Compute this field from the already-resolved mapping
    ///
    /// Computed fields ignore raw input under their own name and bypass
    /// filtering/validation entirely. An `Err` from the closure is logged
    /// and resolves the field to `Null`.
    pub fn computed(
        mut self,
        func: impl Fn(&IndexMap<String, Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.computed = Some(Arc::new(func));
        self
    }

    /// Validate the field's value as a nested mapping with its own pipeline
    ///
    /// A non-mapping value or a nested failure surfaces as a single error
    /// message on this field, never as an expanded error mapping.
    pub fn nested(mut self, filter: InputFilter) -> Self {
        self.nested = Some(Box::new(filter));
        self
    }

    /// The field's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field is required
    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("fallback", &self.fallback)
            .field("filters", &self.filters.len())
            .field("validators", &self.validators.len())
            .field("steps", &self.steps.len())
            .field("external_api", &self.external_api)
            .field("copy_from", &self.copy_from)
            .field("computed", &self.computed.is_some())
            .field("nested", &self.nested.is_some())
            .finish()
    }
}
