//! The validator capability seam
//!
//! A [`Validator`] is a predicate check over a field value: it either
//! accepts the value or rejects it with a human-readable message. The
//! engine stops a field's chain at the first rejection.

use serde_json::Value;

/// A predicate check that accepts or rejects a field's value
///
/// Implementations receive the field name and a reference to the current
/// (already filtered) value. Rejection carries the message that becomes the
/// field's error in the aggregate failure.
pub trait Validator: Send + Sync {
    fn check(&self, field: &str, value: &Value) -> Result<(), String>;
}

/// Any `Fn(&str, &Value) -> Result<(), String>` closure is a validator
impl<F> Validator for F
where
    F: Fn(&str, &Value) -> Result<(), String> + Send + Sync,
{
    fn check(&self, field: &str, value: &Value) -> Result<(), String> {
        self(field, value)
    }
}
