//! Minimal end-to-end demo: declare a filter, validate a payload, and
//! inspect a failing run.
//!
//! Run with: cargo run --example basic

use serde_json::json;
use sift::prelude::*;
use sift::{filters, validators};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift=debug".into()),
        )
        .init();

    let mut filter = InputFilter::new();
    filter.add_field(
        FieldSpec::new("name")
            .required()
            .filter(filters::trim())
            .validator(validators::string_length(1, 80)),
    )?;
    filter.add_field(
        FieldSpec::new("price")
            .required()
            .filter(filters::to_float())
            .validator(validators::is_float())
            .validator(validators::positive()),
    )?;
    filter.add_field(FieldSpec::new("currency").default_value(json!("EUR")))?;
    filter.add_field(FieldSpec::new("label").copy_from("name").filter(filters::uppercase()))?;
    filter.add_condition(CustomCondition::new("PriceBelowLimit", |data| {
        data.get("price").and_then(Value::as_f64).unwrap_or(0.0) < 10_000.0
    }));

    let good = json!({"name": "  Widget  ", "price": "19.99", "ignored": true});
    let values = filter.validate(good.as_object().unwrap()).await?;
    println!("validated: {}", serde_json::to_string_pretty(&values)?);

    let bad = json!({"price": "-3"});
    let report = filter.inspect(bad.as_object().unwrap()).await;
    println!("valid: {}", report.is_valid());
    for (field, message) in report.errors() {
        println!("  {}: {}", field, message);
    }

    Ok(())
}
