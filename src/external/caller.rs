//! External-API call execution
//!
//! One [`ExternalApiCaller`] owns one `reqwest::Client` and is shared by
//! every enrichment field of an [`crate::engine::InputFilter`]. A call
//! either produces the field's value, resolves through the configured
//! fallback, or yields the field error message the engine aggregates.
//! A failed enrichment never aborts the surrounding run.

use super::{ApiMode, ExternalApiConfig, substitute};
use indexmap::IndexMap;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::fmt;

/// Why one HTTP attempt failed
///
/// Attempt-level detail goes to the log; the caller's public outcome is
/// always fallback-or-field-error.
enum CallFailure {
    Transport(reqwest::Error),
    Status(u16),
    Decode(reqwest::Error),
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Transport(e) => write!(f, "transport error: {}", e),
            CallFailure::Status(code) => write!(f, "unexpected status {}", code),
            CallFailure::Decode(e) => write!(f, "invalid JSON response: {}", e),
        }
    }
}

/// Executes external enrichment calls
pub struct ExternalApiCaller {
    client: reqwest::Client,
}

impl ExternalApiCaller {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Resolve one field through its external call
    ///
    /// Applies the mode's attempt policy (one attempt for
    /// [`ApiMode::Sync`], up to `retry_count` attempts with a cooperative
    /// delay for [`ApiMode::Async`]). On exhaustion the fallback is
    /// returned when present; otherwise `Err` carries the field's error
    /// message, exactly "External API call failed for field '<field>'.".
    pub async fn resolve(
        &self,
        field: &str,
        config: &ExternalApiConfig,
        fallback: Option<&Value>,
        data: &IndexMap<String, Value>,
    ) -> Result<Value, String> {
        let attempts = match config.mode {
            ApiMode::Sync => 1,
            ApiMode::Async => config.retry_count.max(1),
        };

        for attempt in 1..=attempts {
            match self.attempt(config, data).await {
                Ok(value) => return Ok(value),
                Err(failure) => {
                    tracing::debug!(
                        field = %field,
                        attempt,
                        attempts,
                        "external API attempt failed: {}",
                        failure
                    );
                    if attempt < attempts {
                        tokio::time::sleep(config.retry_delay).await;
                    }
                }
            }
        }

        match fallback {
            Some(value) => {
                tracing::warn!(field = %field, "external API exhausted, using fallback");
                Ok(value.clone())
            }
            None => Err(format!("External API call failed for field '{}'.", field)),
        }
    }

    /// Resolve a batch of fields concurrently, preserving input order
    ///
    /// All calls are issued at once; each entry resolves through its own
    /// fallback-or-error outcome, so one failure never blocks or corrupts
    /// sibling results. Placeholders substitute from the same `data`
    /// snapshot for every call.
    pub async fn resolve_many(
        &self,
        calls: &[(&str, &ExternalApiConfig, Option<&Value>)],
        data: &IndexMap<String, Value>,
    ) -> Vec<Result<Value, String>> {
        let futures = calls
            .iter()
            .map(|(field, config, fallback)| self.resolve(field, config, *fallback, data));
        futures::future::join_all(futures).await
    }

    /// One HTTP attempt: build, send, check status, decode, extract
    async fn attempt(
        &self,
        config: &ExternalApiConfig,
        data: &IndexMap<String, Value>,
    ) -> Result<Value, CallFailure> {
        let url = substitute(&config.url, data);
        let mut request = self
            .client
            .request(config.method.clone(), url)
            .timeout(config.timeout)
            .headers(build_headers(config));

        if !config.params.is_empty() {
            let params = substituted_params(config, data);
            request = if config.method == reqwest::Method::GET
                || config.method == reqwest::Method::DELETE
            {
                let query: Vec<(String, String)> = params
                    .iter()
                    .map(|(name, value)| {
                        let rendered = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (name.clone(), rendered)
                    })
                    .collect();
                request.query(&query)
            } else {
                request.json(&params)
            };
        }

        let response = request.send().await.map_err(CallFailure::Transport)?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(CallFailure::Status(status));
        }

        let body: Value = response.json().await.map_err(CallFailure::Decode)?;
        Ok(match &config.data_key {
            Some(key) => body.get(key).cloned().unwrap_or(Value::Null),
            None => body,
        })
    }
}

impl Default for ExternalApiCaller {
    fn default() -> Self {
        Self::new()
    }
}

/// Bearer header first, static headers after; static wins on collision
fn build_headers(config: &ExternalApiConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(key) = &config.api_key {
        match HeaderValue::from_str(&format!("Bearer {}", key)) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("api_key is not a valid header value, skipping"),
        }
    }
    for (name, value) in &config.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "invalid static header, skipping"),
        }
    }
    headers
}

/// Substitute `{{key}}` placeholders in string-valued params
fn substituted_params(
    config: &ExternalApiConfig,
    data: &IndexMap<String, Value>,
) -> IndexMap<String, Value> {
    config
        .params
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => Value::String(substitute(s, data)),
                other => other.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}
