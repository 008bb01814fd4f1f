//! Reusable field filters
//!
//! These filters normalize field values before validation. Every filter is
//! total: a value it cannot meaningfully transform is returned unchanged.

use serde_json::{Value, json};

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Value::String(s.trim().to_string())
        } else {
            value
        }
    }
}

/// Filter: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Value::String(s.to_uppercase())
        } else {
            value
        }
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            Value::String(s.to_lowercase())
        } else {
            value
        }
    }
}

/// Filter: round number to specified decimal places
pub fn round_decimals(decimals: u32) -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    move |_: &str, value: Value| {
        if let Some(num) = value.as_f64() {
            let factor = 10_f64.powi(decimals as i32);
            let rounded = (num * factor).round() / factor;
            json!(rounded)
        } else {
            value
        }
    }
}

/// Filter: parse numeric strings into floats
///
/// A string that does not parse is returned unchanged so the following
/// validator can reject it with a proper message.
pub fn to_float() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            match s.trim().parse::<f64>() {
                Ok(num) => json!(num),
                Err(_) => value,
            }
        } else {
            value
        }
    }
}

/// Filter: parse numeric strings into integers
pub fn to_int() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| {
        if let Some(s) = value.as_str() {
            match s.trim().parse::<i64>() {
                Ok(num) => json!(num),
                Err(_) => value,
            }
        } else {
            value
        }
    }
}
