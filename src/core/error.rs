//! Typed error handling for the sift validation engine
//!
//! This module provides a typed error hierarchy that enables callers to
//! handle failures specifically rather than dealing with generic
//! `anyhow::Error` values.
//!
//! # Error Categories
//!
//! - [`ValidationFailure`]: the aggregate outcome of one validation run,
//!   every field and condition error collected into a single mapping
//! - [`ProjectionError`]: the resolved mapping could not be deserialized
//!   into the declared model type (raised only after validation succeeded)
//! - [`ConfigurationError`]: the registration surface was misused (raised
//!   immediately at registration time, never deferred to validation time)
//!
//! # Example
//!
//! ```rust,ignore
//! use sift::prelude::*;
//!
//! match filter.validate(&input).await {
//!     Ok(values) => println!("clean: {:?}", values),
//!     Err(SiftError::Validation(failure)) => {
//!         for (field, message) in failure.errors() {
//!             println!("{}: {}", field, message);
//!         }
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use indexmap::IndexMap;
use std::fmt;

/// The main error type for the sift engine
///
/// Each variant contains a more specific error type for that category.
#[derive(Debug)]
pub enum SiftError {
    /// Aggregate validation failure (field and condition errors)
    Validation(ValidationFailure),

    /// Model projection failure (post-validation, fatal)
    Projection(ProjectionError),

    /// Registration surface misuse
    Configuration(ConfigurationError),
}

impl fmt::Display for SiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiftError::Validation(e) => write!(f, "{}", e),
            SiftError::Projection(e) => write!(f, "{}", e),
            SiftError::Configuration(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiftError::Validation(e) => Some(e),
            SiftError::Projection(e) => Some(e),
            SiftError::Configuration(e) => Some(e),
        }
    }
}

impl SiftError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SiftError::Validation(_) => "VALIDATION_FAILED",
            SiftError::Projection(_) => "PROJECTION_ERROR",
            SiftError::Configuration(e) => e.error_code(),
        }
    }
}

// =============================================================================
// Validation Failure
// =============================================================================

/// The aggregate outcome of a failed validation run
///
/// Carries the full field-name → message mapping produced by one pass over
/// all fields and conditions. Insertion order follows field declaration
/// order, with the reserved condition key appended after field errors.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    errors: IndexMap<String, String>,
}

impl ValidationFailure {
    /// Create a failure from a collected error mapping
    pub fn new(errors: IndexMap<String, String>) -> Self {
        Self { errors }
    }

    /// The full field-name → message mapping
    pub fn errors(&self) -> &IndexMap<String, String> {
        &self.errors
    }

    /// Get the message recorded for one field, if any
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Number of collected errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether the failure carries no messages (never true for a raised failure)
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the failure, yielding the error mapping
    pub fn into_errors(self) -> IndexMap<String, String> {
        self.errors
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "Validation failed: {}", msgs.join(", "))
    }
}

impl std::error::Error for ValidationFailure {}

impl From<ValidationFailure> for SiftError {
    fn from(err: ValidationFailure) -> Self {
        SiftError::Validation(err)
    }
}

// =============================================================================
// Projection Errors
// =============================================================================

/// The resolved mapping could not be constructed into the declared model type
///
/// This signals a programming/schema mismatch (e.g. a model field the filter
/// never declares, or a non-nullable model field left unset), not bad user
/// input. It is raised only after the aggregate validation already
/// succeeded and is never merged into a [`ValidationFailure`].
#[derive(Debug)]
pub struct ProjectionError {
    message: String,
}

impl ProjectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to project validated data into model: {}",
            self.message
        )
    }
}

impl std::error::Error for ProjectionError {}

impl From<ProjectionError> for SiftError {
    fn from(err: ProjectionError) -> Self {
        SiftError::Projection(err)
    }
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::new(err.to_string())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised by the registration surface
///
/// These are raised immediately when a filter is (mis)assembled and never
/// deferred to validation time.
#[derive(Debug, Clone)]
pub enum ConfigurationError {
    /// A field with this name is already registered
    DuplicateField { name: String },

    /// No field with this name is registered
    UnknownField { name: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::DuplicateField { name } => {
                write!(f, "Field '{}' is already registered", name)
            }
            ConfigurationError::UnknownField { name } => {
                write!(f, "No field named '{}' is registered", name)
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

impl ConfigurationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigurationError::DuplicateField { .. } => "DUPLICATE_FIELD",
            ConfigurationError::UnknownField { .. } => "UNKNOWN_FIELD",
        }
    }
}

impl From<ConfigurationError> for SiftError {
    fn from(err: ConfigurationError) -> Self {
        SiftError::Configuration(err)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for sift operations
pub type SiftResult<T> = Result<T, SiftError>;

// =============================================================================
// Tests
// =============================================================================
