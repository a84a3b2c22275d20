//! HTTP lookup adapters against a mock endpoint.

use std::time::Duration;

use fn_enricher::domain::error::{Attribute, LookupError};
use fn_enricher::domain::ports::AttributeLookup;
use fn_enricher::infra::lookup::{AgeLookup, GenderLookup, NationalityLookup};
use httpmock::prelude::*;
use serde_json::json;
use url::Url;

fn base(server: &MockServer, path: &str) -> Url {
    Url::parse(&server.url(path)).unwrap()
}

#[tokio::test]
async fn age_lookup_sends_name_and_parses_age() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/age").query_param("name", "Rivka");
            then.status(200)
                .json_body(json!({"count": 1200, "name": "Rivka", "age": 67}));
        })
        .await;

    let lookup = AgeLookup::new(base(&server, "/age?name="), Duration::from_secs(5)).unwrap();
    let age = lookup.resolve("Rivka").await.unwrap();

    mock.assert_async().await;
    assert_eq!(age, 67);
}

#[tokio::test]
async fn gender_and_nationality_lookups_parse_bodies() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gender").query_param("name", "Rivka");
            then.status(200).json_body(
                json!({"count": 10, "name": "Rivka", "gender": "female", "probability": 0.97}),
            );
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/nationality").query_param("name", "Rivka");
            then.status(200).json_body(json!({
                "count": 10,
                "name": "Rivka",
                "country": [
                    {"country_id": "IL", "probability": 0.55},
                    {"country_id": "UA", "probability": 0.12}
                ]
            }));
        })
        .await;

    let gender = GenderLookup::new(base(&server, "/gender"), Duration::from_secs(5)).unwrap();
    let nationality =
        NationalityLookup::new(base(&server, "/nationality"), Duration::from_secs(5)).unwrap();

    assert_eq!(gender.resolve("Rivka").await.unwrap(), "female");
    assert_eq!(nationality.resolve("Rivka").await.unwrap(), "IL");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/gender");
            then.status(503);
        })
        .await;

    let lookup = GenderLookup::new(base(&server, "/gender"), Duration::from_secs(5)).unwrap();
    let err = lookup.resolve("Rivka").await.unwrap_err();

    assert_eq!(
        err,
        LookupError::Status {
            attribute: Attribute::Gender,
            status: 503
        }
    );
    assert_eq!(err.to_string(), "gender lookup: response status code: 503");
}

#[tokio::test]
async fn empty_answers_are_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/age");
            then.status(200)
                .json_body(json!({"count": 0, "name": "Qwzx", "age": null}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/nationality");
            then.status(200)
                .json_body(json!({"count": 0, "name": "Qwzx", "country": []}));
        })
        .await;

    let age = AgeLookup::new(base(&server, "/age"), Duration::from_secs(5)).unwrap();
    let nationality =
        NationalityLookup::new(base(&server, "/nationality"), Duration::from_secs(5)).unwrap();

    assert!(matches!(
        age.resolve("Qwzx").await,
        Err(LookupError::Empty {
            attribute: Attribute::Age,
            ..
        })
    ));
    assert!(matches!(
        nationality.resolve("Qwzx").await,
        Err(LookupError::Empty {
            attribute: Attribute::Nationality,
            ..
        })
    ));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/age");
            then.status(200).body("<html>rate limited</html>");
        })
        .await;

    let lookup = AgeLookup::new(base(&server, "/age"), Duration::from_secs(5)).unwrap();
    assert!(matches!(
        lookup.resolve("Rivka").await,
        Err(LookupError::Decode {
            attribute: Attribute::Age,
            ..
        })
    ));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/age");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"count": 1, "name": "Rivka", "age": 67}));
        })
        .await;

    let lookup = AgeLookup::new(base(&server, "/age"), Duration::from_millis(100)).unwrap();
    let err = lookup.resolve("Rivka").await.unwrap_err();

    assert_eq!(
        err,
        LookupError::Timeout {
            attribute: Attribute::Age
        }
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Nothing listens on port 9 (discard) in test environments.
    let lookup = AgeLookup::new(
        Url::parse("http://127.0.0.1:9/age").unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();

    match lookup.resolve("Rivka").await {
        Err(LookupError::Transport { attribute, .. }) | Err(LookupError::Timeout { attribute }) => {
            assert_eq!(attribute, Attribute::Age)
        }
        other => panic!("expected a transport failure, got {other:?}"),
    }
}
