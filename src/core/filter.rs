//! The filter capability seam
//!
//! A [`Filter`] is a total transform over a field value: it normalizes what
//! it understands and returns everything else unchanged. Filters never
//! fail; anything fallible belongs in a validator.

use serde_json::Value;

/// A total, non-failing transform applied to a field's value
///
/// Implementations receive the field name (for logging/diagnostics) and the
/// current value, and must always return a value. A filter that cannot
/// meaningfully transform a value returns it unchanged.
pub trait Filter: Send + Sync {
    fn apply(&self, field: &str, value: Value) -> Value;
}

/// Any `Fn(&str, Value) -> Value` closure is a filter
///
/// This covers the built-in factories in [`crate::filters`] as well as
/// ad-hoc closures declared inline on a field.
impl<F> Filter for F
where
    F: Fn(&str, Value) -> Value + Send + Sync,
{
    fn apply(&self, field: &str, value: Value) -> Value {
        self(field, value)
    }
}
