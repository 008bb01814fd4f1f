//! External-API enrichment
//!
//! A field may be resolved by calling a remote HTTP endpoint instead of
//! reading raw input. The [`ExternalApiConfig`] describes one call (URL
//! template, method, params, headers, auth, response extraction, and
//! sync/async retry semantics) and the [`ExternalApiCaller`] executes it,
//! substituting `{{field}}` placeholders from the data resolved so far.

pub mod caller;

pub use caller::ExternalApiCaller;

use indexmap::IndexMap;
use serde_json::Value;
use std::time::Duration;

/// Execution mode for an external call
///
/// `Sync` performs a single sequential attempt with the configured timeout.
/// `Async` adds cooperative retries (`retry_count` attempts, `retry_delay`
/// between them) and makes the field eligible for the ordered parallel
/// batch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    Sync,
    Async,
}

/// Immutable description of one external enrichment call
///
/// # Example
///
/// ```ignore
/// let config = ExternalApiConfig::new("https://geo.example.com/zip/{{zip_code}}")
///     .method(reqwest::Method::GET)
///     .data_key("city")
///     .mode(ApiMode::Async)
///     .retry(3, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct ExternalApiConfig {
    pub(crate) url: String,
    pub(crate) method: reqwest::Method,
    pub(crate) params: IndexMap<String, Value>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) api_key: Option<String>,
    pub(crate) data_key: Option<String>,
    pub(crate) mode: ApiMode,
    pub(crate) timeout: Duration,
    pub(crate) retry_count: u32,
    pub(crate) retry_delay: Duration,
}

impl ExternalApiConfig {
    /// Start a config for the given URL template
    ///
    /// `{{name}}` occurrences in the URL are substituted with the
    /// stringified resolved value of that field at call time.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: reqwest::Method::GET,
            params: IndexMap::new(),
            headers: Vec::new(),
            api_key: None,
            data_key: None,
            mode: ApiMode::Sync,
            timeout: Duration::from_secs(30),
            retry_count: 1,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// HTTP method (default GET)
    pub fn method(mut self, method: reqwest::Method) -> Self {
        self.method = method;
        self
    }

    /// Add one request parameter
    ///
    /// String values may contain `{{name}}` placeholders. Params are sent
    /// as the query string for GET/DELETE and as a JSON body otherwise.
    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Add one static header; static headers win over the bearer header on
    /// name collision
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Bearer token sent as `Authorization: Bearer <key>`
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Key to extract from the JSON response
    ///
    /// Without a data key the whole decoded JSON body is the field's value.
    /// A configured key missing from the response extracts `Null`.
    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }

    /// Execution mode (default [`ApiMode::Sync`])
    pub fn mode(mut self, mode: ApiMode) -> Self {
        self.mode = mode;
        self
    }

    /// Per-attempt timeout (default 30 s)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Async retry policy: total attempts (minimum 1) and the cooperative
    /// delay between them
    ///
    /// Ignored in [`ApiMode::Sync`], which always performs one attempt.
    pub fn retry(mut self, count: u32, delay: Duration) -> Self {
        self.retry_count = count;
        self.retry_delay = delay;
        self
    }
}

// =============================================================================
// Placeholder substitution
// =============================================================================

/// Substitute every `{{key}}` occurrence in `template` from the resolved
/// mapping
///
/// An absent key, like a key that resolved to `Null`, substitutes the
/// literal text `None`. This quirk is part of the enrichment contract;
/// callers pattern-match on it, so it is not a defensive guard to remove.
/// Strings substitute without quotes; other values use their JSON
/// rendering. An unterminated `{{` is copied through verbatim.
pub(crate) fn substitute(template: &str, data: &IndexMap<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                out.push_str(&stringify(data.get(key)));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render a resolved value for placeholder substitution
pub(crate) fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
