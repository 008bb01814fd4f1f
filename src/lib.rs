//! # Sift
//!
//! A declarative input-validation and filtering engine for web APIs in Rust.
//!
//! ## Features
//!
//! - **Declared Fields**: Each field carries its own ordered filter and
//!   validation chains, required-ness, default, and fallback
//! - **Partial-Failure Aggregation**: Every field and condition error from
//!   one run is collected into a single structured failure
//! - **Cross-Field Rules**: Conditions evaluated against the fully-resolved
//!   mapping
//! - **Derived Fields**: Copy another field's cleaned value, or compute a
//!   field from the data resolved so far
//! - **Nested Pipelines**: Validate nested mappings with their own filter
//! - **External Enrichment**: Resolve a field by calling a remote HTTP API,
//!   with retry, fallback, and an order-preserving parallel batch path
//! - **Model Projection**: Deserialize the cleaned output into your own
//!   types via serde
//!
//! ## Quick Start
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
//! let payload = serde_json::json!({"name": " Widget ", "price": "19.99"});
//! let values = filter
//!     .validate(payload.as_object().unwrap())
//!     .await?;
//!
//! assert_eq!(values["name"], "Widget");
//! assert_eq!(values["price"], 19.99);
//! ```

pub mod core;
pub mod engine;
pub mod external;
pub mod filters;
pub mod validators;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        condition::{
            CONDITION_ERROR_KEY, Condition, CustomCondition, EqualCondition,
            ExactlyOneOfCondition,
        },
        error::{ConfigurationError, ProjectionError, SiftError, SiftResult, ValidationFailure},
        field::{FieldSpec, Step},
        filter::Filter,
        validator::Validator,
    };

    // === Engine ===
    pub use crate::engine::{InputFilter, ValidationReport};

    // === External API ===
    pub use crate::external::{ApiMode, ExternalApiCaller, ExternalApiConfig};

    // === External dependencies ===
    pub use indexmap::IndexMap;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Map, Value, json};
}
