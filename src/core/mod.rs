//! Core module containing the fundamental traits and types of the engine

pub mod condition;
pub mod error;
pub mod field;
pub mod filter;
pub mod validator;

pub use condition::{CONDITION_ERROR_KEY, Condition, CustomCondition};
pub use error::{ConfigurationError, ProjectionError, SiftError, SiftResult, ValidationFailure};
pub use field::{FieldSpec, Step};
pub use filter::Filter;
pub use validator::Validator;
