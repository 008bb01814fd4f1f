//! The per-field resolution state machine
//!
//! One [`FieldProcessor`] run walks the declared fields in order and, for
//! each, selects the value source (nested pipeline, copy-from, computed,
//! external API, or raw input), applies defaults, runs the filter and
//! validation chains, and resolves fallback/required outcomes. Errors are
//! accumulated across fields; only an individual field's own chain
//! short-circuits at its first validator rejection. Conditions are
//! evaluated afterwards against the full resolved mapping, even when
//! fields already errored.

use crate::core::condition::CONDITION_ERROR_KEY;
use crate::core::field::{FieldSpec, Step};
use crate::engine::InputFilter;
use crate::external::{ApiMode, ExternalApiConfig};
use futures::FutureExt;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Everything one run produces
pub(crate) struct RunOutcome {
    pub(crate) values: IndexMap<String, Value>,
    pub(crate) errors: IndexMap<String, String>,
    pub(crate) unknown: Vec<String>,
}

#[derive(Clone, Copy)]
pub(crate) struct FieldProcessor<'a> {
    filter: &'a InputFilter,
}

impl<'a> FieldProcessor<'a> {
    pub(crate) fn new(filter: &'a InputFilter) -> Self {
        Self { filter }
    }

    /// Run the full pipeline over one raw input mapping
    ///
    /// Boxed because nested field specs recurse into a sub-run.
    pub(crate) fn run<'b>(self, input: &'b Map<String, Value>) -> BoxFuture<'b, RunOutcome>
    where
        'a: 'b,
    {
        async move {
            let mut values: IndexMap<String, Value> = IndexMap::new();
            let mut errors: IndexMap<String, String> = IndexMap::new();
            let mut prefetched: Option<HashMap<String, Result<Value, String>>> = None;

            for (index, spec) in self.filter.fields.iter().enumerate() {
                // The ordered batch fires once, when the first async
                // enrichment field is reached: everything declared before
                // it is already resolved and visible to placeholders.
                if prefetched.is_none()
                    && self.filter.parallel_enrichment
                    && is_async_enrichment(spec)
                {
                    prefetched =
                        Some(self.prefetch(&self.filter.fields[index..], &values).await);
                }
                self.process_field(spec, input, &mut values, &mut errors, prefetched.as_mut())
                    .await;
            }

            for condition in &self.filter.conditions {
                if !condition.evaluate(&values) {
                    tracing::debug!(condition = %condition.name(), "condition not met");
                    errors.insert(
                        CONDITION_ERROR_KEY.to_string(),
                        format!("Condition '{}' not met.", condition.name()),
                    );
                }
            }

            let unknown: Vec<String> = input
                .keys()
                .filter(|key| !self.filter.has_field(key))
                .cloned()
                .collect();

            RunOutcome {
                values,
                errors,
                unknown,
            }
        }
        .boxed()
    }

    /// Issue every remaining async enrichment call as one ordered batch
    async fn prefetch(
        &self,
        specs: &[FieldSpec],
        resolved: &IndexMap<String, Value>,
    ) -> HashMap<String, Result<Value, String>> {
        let calls: Vec<(&str, &ExternalApiConfig, Option<&Value>)> = specs
            .iter()
            .filter(|spec| is_async_enrichment(spec))
            .filter_map(|spec| {
                spec.external_api
                    .as_ref()
                    .map(|config| (spec.name.as_str(), config, spec.fallback.as_ref()))
            })
            .collect();
        tracing::debug!(calls = calls.len(), "issuing parallel enrichment batch");
        let results = self.filter.caller.resolve_many(&calls, resolved).await;
        calls
            .into_iter()
            .zip(results)
            .map(|((name, _, _), result)| (name.to_string(), result))
            .collect()
    }

    /// Resolve one field into the values/errors mappings
    async fn process_field(
        &self,
        spec: &FieldSpec,
        input: &Map<String, Value>,
        values: &mut IndexMap<String, Value>,
        errors: &mut IndexMap<String, String>,
        prefetched: Option<&mut HashMap<String, Result<Value, String>>>,
    ) {
        let name = spec.name.as_str();
        // Absent means key missing or explicit null; 0, false, "" and []
        // are present values.
        let raw = input.get(name).filter(|v| !v.is_null());

        let mut value: Option<Value> = None;

        if let Some(sub) = &spec.nested {
            if let Some(raw) = raw {
                match raw {
                    Value::Object(map) => {
                        let outcome = FieldProcessor::new(sub).run(map).await;
                        if outcome.errors.is_empty() {
                            let object: Map<String, Value> =
                                outcome.values.into_iter().collect();
                            value = Some(Value::Object(object));
                        } else {
                            let summary: Vec<String> = outcome
                                .errors
                                .iter()
                                .map(|(field, message)| format!("{}: {}", field, message))
                                .collect();
                            errors.insert(
                                name.to_string(),
                                format!("Nested validation failed: {}", summary.join("; ")),
                            );
                            values.insert(name.to_string(), Value::Null);
                            return;
                        }
                    }
                    other => {
                        errors.insert(
                            name.to_string(),
                            format!(
                                "Field '{}' must be a mapping, got {}.",
                                name,
                                json_type(other)
                            ),
                        );
                        values.insert(name.to_string(), Value::Null);
                        return;
                    }
                }
            }
        } else if let Some(source) = &spec.copy_from {
            // Post-filter value of an earlier-declared field; a later or
            // unresolved source reads as absent.
            value = values.get(source).filter(|v| !v.is_null()).cloned();
        } else if let Some(compute) = &spec.computed {
            // Computed fields ignore raw input under their own name and
            // bypass the filter/validation chain entirely.
            match (compute.as_ref())(values) {
                Ok(computed) => {
                    values.insert(name.to_string(), computed);
                }
                Err(err) => {
                    tracing::warn!(field = %name, "computed field failed: {}", err);
                    values.insert(name.to_string(), Value::Null);
                }
            }
            return;
        } else if let Some(config) = &spec.external_api {
            let outcome = match prefetched.and_then(|batch| batch.remove(name)) {
                Some(result) => result,
                None => {
                    self.filter
                        .caller
                        .resolve(name, config, spec.fallback.as_ref(), values)
                        .await
                }
            };
            match outcome {
                Ok(resolved) => value = Some(resolved),
                Err(message) => {
                    errors.insert(name.to_string(), message);
                    values.insert(name.to_string(), Value::Null);
                    return;
                }
            }
        } else {
            value = raw.cloned();
        }

        // Defaults are trusted as-is: no filtering, no validation.
        if value.is_none() {
            if let Some(default) = &spec.default {
                values.insert(name.to_string(), default.clone());
                return;
            }
        }

        if let Some(present) = value {
            match self.run_chain(spec, name, present) {
                Ok(clean) => {
                    values.insert(name.to_string(), clean);
                }
                Err(message) => {
                    if let Some(fb) = &spec.fallback {
                        values.insert(name.to_string(), fb.clone());
                    } else if spec.required {
                        tracing::debug!(field = %name, "validation rejected: {}", message);
                        errors.insert(name.to_string(), message);
                        values.insert(name.to_string(), Value::Null);
                    } else {
                        values.insert(name.to_string(), Value::Null);
                    }
                }
            }
            return;
        }

        // Still absent after every source: fallback satisfies required.
        if spec.required {
            if let Some(fb) = &spec.fallback {
                values.insert(name.to_string(), fb.clone());
            } else {
                errors.insert(
                    name.to_string(),
                    format!("Field '{}' is required.", name),
                );
                values.insert(name.to_string(), Value::Null);
            }
        } else {
            values.insert(name.to_string(), Value::Null);
        }
    }

    /// Filter and validate one present value; `Err` is the first rejection
    fn run_chain(&self, spec: &FieldSpec, name: &str, mut value: Value) -> Result<Value, String> {
        if spec.steps.is_empty() {
            for filter in &spec.filters {
                value = filter.apply(name, value);
            }
        } else {
            for step in &spec.steps {
                match step {
                    Step::Filter(filter) => value = filter.apply(name, value),
                    Step::Validator(validator) => validator.check(name, &value)?,
                }
            }
        }
        for filter in &self.filter.global_filters {
            value = filter.apply(name, value);
        }
        if spec.steps.is_empty() {
            for validator in &spec.validators {
                validator.check(name, &value)?;
            }
        }
        for validator in &self.filter.global_validators {
            validator.check(name, &value)?;
        }
        Ok(value)
    }
}

/// Fields eligible for the parallel enrichment batch
fn is_async_enrichment(spec: &FieldSpec) -> bool {
    spec.nested.is_none()
        && spec.copy_from.is_none()
        && spec.computed.is_none()
        && spec
            .external_api
            .as_ref()
            .is_some_and(|config| config.mode == ApiMode::Async)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
