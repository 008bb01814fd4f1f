//! Integration tests for external-API enrichment, backed by wiremock

use serde_json::json;
use sift::prelude::*;
use sift::{filters, validators};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(value: Value) -> Map<String, Value> {
    value.as_object().expect("payload must be an object").clone()
}

fn data(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// === response handling ===

#[tokio::test]
async fn test_success_returns_whole_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "Paris", "zip": "75001"})))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(format!("{}/profile", server.uri()));
    let value = caller.resolve("profile", &config, None, &data(&[])).await.unwrap();
    assert_eq!(value, json!({"city": "Paris", "zip": "75001"}));
}

#[tokio::test]
async fn test_data_key_extracts_from_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "Paris"})))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(format!("{}/profile", server.uri())).data_key("city");
    let value = caller.resolve("city", &config, None, &data(&[])).await.unwrap();
    assert_eq!(value, json!("Paris"));
}

#[tokio::test]
async fn test_missing_data_key_extracts_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "Paris"})))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri()).data_key("country");
    let value = caller.resolve("country", &config, None, &data(&[])).await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_non_200_with_fallback_is_recoverable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri());
    let fallback = json!("default-city");
    let value = caller
        .resolve("city", &config, Some(&fallback), &data(&[]))
        .await
        .unwrap();
    assert_eq!(value, json!("default-city"));
}

#[tokio::test]
async fn test_non_200_without_fallback_is_exact_field_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri());
    let err = caller.resolve("city", &config, None, &data(&[])).await.unwrap_err();
    assert_eq!(err, "External API call failed for field 'city'.");
}

#[tokio::test]
async fn test_created_status_is_a_failure() {
    // The contract is literally status == 200, not the 2xx class.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri()).method(reqwest::Method::POST);
    assert!(caller.resolve("id", &config, None, &data(&[])).await.is_err());
}

#[tokio::test]
async fn test_invalid_json_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri());
    let fallback = json!({});
    let value = caller
        .resolve("profile", &config, Some(&fallback), &data(&[]))
        .await
        .unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_timeout_resolves_to_fallback_never_hangs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri()).timeout(Duration::from_millis(50));
    let fallback = json!("on-time");
    let value = caller
        .resolve("slow", &config, Some(&fallback), &data(&[]))
        .await
        .unwrap();
    assert_eq!(value, json!("on-time"));
}

// === request building ===

#[tokio::test]
async fn test_url_placeholder_substitution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("found")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(format!("{}/users/{{{{user}}}}", server.uri()));
    let value = caller
        .resolve("lookup", &config, None, &data(&[("user", json!("ada"))]))
        .await
        .unwrap();
    assert_eq!(value, json!("found"));
}

#[tokio::test]
async fn test_absent_placeholder_substitutes_literal_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/None"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("quirky")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(format!("{}/users/{{{{ghost}}}}", server.uri()));
    let value = caller.resolve("lookup", &config, None, &data(&[])).await.unwrap();
    assert_eq!(value, json!("quirky"));
}

#[tokio::test]
async fn test_bearer_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("ok")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri()).api_key("s3cret");
    assert!(caller.resolve("x", &config, None, &data(&[])).await.is_ok());
}

#[tokio::test]
async fn test_static_header_wins_over_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Token override"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("ok")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri())
        .api_key("s3cret")
        .header("Authorization", "Token override");
    assert!(caller.resolve("x", &config, None, &data(&[])).await.is_ok());
}

#[tokio::test]
async fn test_get_params_sent_as_query_with_substitution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("q", "ada"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("ok")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri())
        .param("q", json!("{{name}}"))
        .param("limit", json!(10));
    assert!(
        caller
            .resolve("x", &config, None, &data(&[("name", json!("ada"))]))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_post_params_sent_as_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"q": "ada"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("ok")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri())
        .method(reqwest::Method::POST)
        .param("q", json!("{{name}}"));
    assert!(
        caller
            .resolve("x", &config, None, &data(&[("name", json!("ada"))]))
            .await
            .is_ok()
    );
}

// === retry semantics ===

#[tokio::test]
async fn test_async_mode_retries_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("third-time")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri())
        .mode(ApiMode::Async)
        .retry(3, Duration::from_millis(10));
    let value = caller.resolve("x", &config, None, &data(&[])).await.unwrap();
    assert_eq!(value, json!("third-time"));
}

#[tokio::test]
async fn test_async_mode_exhaustion_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config = ExternalApiConfig::new(server.uri())
        .mode(ApiMode::Async)
        .retry(2, Duration::from_millis(10));
    let fallback = json!("gave-up");
    let value = caller
        .resolve("x", &config, Some(&fallback), &data(&[]))
        .await
        .unwrap();
    assert_eq!(value, json!("gave-up"));
}

#[tokio::test]
async fn test_sync_mode_never_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("second-attempt")))
        .expect(0)
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    // retry() is ignored in sync mode: one attempt, then fallback.
    let config = ExternalApiConfig::new(server.uri()).retry(3, Duration::from_millis(10));
    let fallback = json!("single-shot");
    let value = caller
        .resolve("x", &config, Some(&fallback), &data(&[]))
        .await
        .unwrap();
    assert_eq!(value, json!("single-shot"));
}

// === batch mode ===

#[tokio::test]
async fn test_batch_preserves_input_order_regardless_of_completion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("A"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("B"))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("C")))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let config_a = ExternalApiConfig::new(format!("{}/a", server.uri())).mode(ApiMode::Async);
    let config_b = ExternalApiConfig::new(format!("{}/b", server.uri())).mode(ApiMode::Async);
    let config_c = ExternalApiConfig::new(format!("{}/c", server.uri())).mode(ApiMode::Async);

    let results = caller
        .resolve_many(
            &[
                ("a", &config_a, None),
                ("b", &config_b, None),
                ("c", &config_c, None),
            ],
            &data(&[]),
        )
        .await;

    let values: Vec<Value> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(values, vec![json!("A"), json!("B"), json!("C")]);
}

#[tokio::test]
async fn test_batch_sibling_failure_does_not_corrupt_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("fine")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let caller = ExternalApiCaller::new();
    let good = ExternalApiConfig::new(format!("{}/good", server.uri())).mode(ApiMode::Async);
    let bad = ExternalApiConfig::new(format!("{}/bad", server.uri())).mode(ApiMode::Async);

    let results = caller
        .resolve_many(&[("good", &good, None), ("bad", &bad, None)], &data(&[]))
        .await;

    assert_eq!(results[0], Ok(json!("fine")));
    assert_eq!(
        results[1],
        Err("External API call failed for field 'bad'.".to_string())
    );
}

// === engine integration ===

#[tokio::test]
async fn test_enrichment_field_through_the_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zip/75001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"city": "paris"})))
        .mount(&server)
        .await;

    let mut filter = InputFilter::new();
    filter.add_field(FieldSpec::new("zip_code").required()).unwrap();
    filter
        .add_field(
            FieldSpec::new("city")
                .external_api(
                    ExternalApiConfig::new(format!("{}/zip/{{{{zip_code}}}}", server.uri()))
                        .data_key("city"),
                )
                // Enrichment results still run the field's own chain.
                .filter(filters::uppercase())
                .validator(validators::is_string()),
        )
        .unwrap();

    let values = filter
        .validate(&payload(json!({"zip_code": "75001"})))
        .await
        .unwrap();
    assert_eq!(values["city"], json!("PARIS"));
}

#[tokio::test]
async fn test_enrichment_failure_aggregates_with_other_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut filter = InputFilter::new();
    filter.add_field(FieldSpec::new("name").required()).unwrap();
    filter
        .add_field(FieldSpec::new("city").external_api(ExternalApiConfig::new(server.uri())))
        .unwrap();

    let err = filter.validate(&payload(json!({}))).await.unwrap_err();
    match err {
        SiftError::Validation(failure) => {
            assert_eq!(failure.len(), 2);
            assert_eq!(failure.get("name"), Some("Field 'name' is required."));
            assert_eq!(
                failure.get("city"),
                Some("External API call failed for field 'city'.")
            );
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_enrichment_fallback_contributes_zero_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut filter = InputFilter::new();
    filter
        .add_field(
            FieldSpec::new("city")
                .external_api(ExternalApiConfig::new(server.uri()))
                .fallback(json!("Unknown")),
        )
        .unwrap();

    let values = filter.validate(&payload(json!({}))).await.unwrap();
    assert_eq!(values["city"], json!("Unknown"));
}

#[tokio::test]
async fn test_enrichment_ignores_raw_input_under_its_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("from-api")))
        .mount(&server)
        .await;

    let mut filter = InputFilter::new();
    filter
        .add_field(FieldSpec::new("city").external_api(ExternalApiConfig::new(server.uri())))
        .unwrap();

    let values = filter
        .validate(&payload(json!({"city": "spoofed"})))
        .await
        .unwrap();
    assert_eq!(values["city"], json!("from-api"));
}

#[tokio::test]
async fn test_parallel_enrichment_resolves_all_fields_in_position() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!("one"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("two")))
        .mount(&server)
        .await;

    let mut filter = InputFilter::new();
    filter.add_field(FieldSpec::new("label").required()).unwrap();
    filter
        .add_field(
            FieldSpec::new("first").external_api(
                ExternalApiConfig::new(format!("{}/first", server.uri())).mode(ApiMode::Async),
            ),
        )
        .unwrap();
    filter
        .add_field(
            FieldSpec::new("second").external_api(
                ExternalApiConfig::new(format!("{}/second", server.uri())).mode(ApiMode::Async),
            ),
        )
        .unwrap();
    filter.parallel_enrichment(true);

    let values = filter
        .validate(&payload(json!({"label": "batch"})))
        .await
        .unwrap();
    let keys: Vec<&String> = values.keys().collect();
    assert_eq!(keys, vec!["label", "first", "second"]);
    assert_eq!(values["first"], json!("one"));
    assert_eq!(values["second"], json!("two"));
}
