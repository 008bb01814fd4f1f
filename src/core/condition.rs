//! Cross-field conditions
//!
//! Conditions are rules evaluated against the fully-resolved mapping after
//! every field has been processed. A failing condition is reported under
//! the reserved [`CONDITION_ERROR_KEY`] pseudo-field; when several
//! conditions fail in one run, the last failure's message wins.

use indexmap::IndexMap;
use serde_json::Value;

/// Reserved pseudo-field key under which condition failures are reported
pub const CONDITION_ERROR_KEY: &str = "_condition";

/// A cross-field rule over the fully-resolved mapping
///
/// `name` appears in the failure message ("Condition '<name>' not met.").
/// Conditions must not hold run-specific mutable state; one instance is
/// reused across concurrent validation runs.
pub trait Condition: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, data: &IndexMap<String, Value>) -> bool;
}

// =============================================================================
// CustomCondition
// =============================================================================

/// Wraps a user-supplied predicate closure under an explicit name
pub struct CustomCondition {
    name: String,
    predicate: Box<dyn Fn(&IndexMap<String, Value>) -> bool + Send + Sync>,
}

impl CustomCondition {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&IndexMap<String, Value>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl Condition for CustomCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, data: &IndexMap<String, Value>) -> bool {
        (self.predicate)(data)
    }
}

// =============================================================================
// EqualCondition
// =============================================================================

/// Requires two fields to hold equal resolved values
///
/// A field that resolved to nothing compares as `Null`, so two absent
/// fields are considered equal.
pub struct EqualCondition {
    first: String,
    second: String,
}

impl EqualCondition {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

impl Condition for EqualCondition {
    fn name(&self) -> &str {
        "EqualCondition"
    }

    fn evaluate(&self, data: &IndexMap<String, Value>) -> bool {
        let first = data.get(&self.first).unwrap_or(&Value::Null);
        let second = data.get(&self.second).unwrap_or(&Value::Null);
        first == second
    }
}

// =============================================================================
// ExactlyOneOfCondition
// =============================================================================

/// Requires exactly one of the named fields to hold a non-null value
pub struct ExactlyOneOfCondition {
    fields: Vec<String>,
}

impl ExactlyOneOfCondition {
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Condition for ExactlyOneOfCondition {
    fn name(&self) -> &str {
        "ExactlyOneOfCondition"
    }

    fn evaluate(&self, data: &IndexMap<String, Value>) -> bool {
        let set = self
            .fields
            .iter()
            .filter(|field| data.get(*field).is_some_and(|v| !v.is_null()))
            .count();
        set == 1
    }
}
