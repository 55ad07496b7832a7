//! End-to-end HTTP tests for the registry over the in-memory adapters.

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

use umarell::domain::ports::SubscriptionBroker;
use umarell::domain::{DEFAULT_SUBSCRIPTION, DEFAULT_TOPIC, PostalCodeFilter, TRACE_ID_HEADER};

mod support;

use support::Stack;

async fn call(stack: &Stack, req: test::TestRequest) -> (StatusCode, Value) {
    let app = test::init_service(stack.app()).await;
    let res = test::call_service(&app, req.to_request()).await;
    assert!(
        res.headers().contains_key(TRACE_ID_HEADER),
        "every response carries a trace id"
    );
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

fn post(uri: &str, payload: Value) -> test::TestRequest {
    test::TestRequest::post().uri(uri).set_json(payload)
}

fn get(uri: &str) -> test::TestRequest {
    test::TestRequest::get().uri(uri)
}

fn via_roma() -> Value {
    json!({"address": "Via Roma", "postalCode": 20100})
}

fn mario() -> Value {
    json!({"firstName": "Mario", "lastName": "Rossi", "postalCode": 20100})
}

#[rstest]
#[case("/api/v1/umarell/0")]
#[case("/api/v1/umarell/-3")]
#[case("/api/v1/umarell/abc")]
#[case("/api/v1/cantiere/1.5")]
#[case("/api/v1/cantiere/01")]
#[actix_web::test]
async fn malformed_ids_are_rejected_on_get(#[case] uri: &str) {
    let stack = Stack::new();
    let (status, body) = call(&stack, get(uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "invalid_id");
}

#[rstest]
#[case("/api/v1/umarell/x", mario())]
#[case("/api/v1/cantiere/0", via_roma())]
#[actix_web::test]
async fn malformed_ids_are_rejected_on_create(#[case] uri: &str, #[case] payload: Value) {
    let stack = Stack::new();
    let (status, _) = call(&stack, post(uri, payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn watcher_create_then_get() {
    let stack = Stack::new();
    let (created, body) = call(&stack, post("/api/v1/umarell/1", mario())).await;
    assert_eq!(created, StatusCode::CREATED);
    assert_eq!(body, mario());

    let (status, fetched) = call(&stack, get("/api/v1/umarell/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, mario());

    let (missing, _) = call(&stack, get("/api/v1/cantiere/1")).await;
    assert_eq!(missing, StatusCode::NOT_FOUND, "collections are separate");
}

#[actix_web::test]
async fn duplicate_create_conflicts_and_keeps_first_payload() {
    let stack = Stack::new();
    call(&stack, post("/api/v1/cantiere/1", via_roma())).await;

    let (status, body) = call(
        &stack,
        post(
            "/api/v1/cantiere/1",
            json!({"address": "Corso Como", "postalCode": 20154}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (_, fetched) = call(&stack, get("/api/v1/cantiere/1")).await;
    assert_eq!(fetched, via_roma());
}

#[actix_web::test]
async fn invalid_payload_reports_field_errors() {
    let stack = Stack::new();
    let (status, body) = call(
        &stack,
        post(
            "/api/v1/cantiere/2",
            json!({"address": "", "postalCode": 9999}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "validation_failed");
    let errors = body["details"]["errors"]
        .as_array()
        .cloned()
        .unwrap_or_default();
    assert!(!errors.is_empty());

    let (missing, _) = call(&stack, get("/api/v1/cantiere/2")).await;
    assert_eq!(missing, StatusCode::NOT_FOUND, "nothing stored");
}

#[rstest]
#[case(10_000, StatusCode::CREATED)]
#[case(99_999, StatusCode::CREATED)]
#[case(9_999, StatusCode::BAD_REQUEST)]
#[case(100_000, StatusCode::BAD_REQUEST)]
#[actix_web::test]
async fn postal_code_bounds(#[case] postal_code: i64, #[case] expected: StatusCode) {
    let stack = Stack::new();
    let (status, _) = call(
        &stack,
        post(
            "/api/v1/cantiere/1",
            json!({"address": "Via Roma", "postalCode": postal_code}),
        ),
    )
    .await;
    assert_eq!(status, expected);
}

#[actix_web::test]
async fn site_creation_publishes_one_notification() {
    let stack = Stack::new();
    stack
        .broker
        .create_subscription(
            DEFAULT_SUBSCRIPTION,
            DEFAULT_TOPIC,
            &PostalCodeFilter::any().to_expr(),
        )
        .await
        .expect("subscription");

    let (status, _) = call(&stack, post("/api/v1/cantiere/1", via_roma())).await;
    assert_eq!(status, StatusCode::CREATED);
    call(&stack, post("/api/v1/umarell/1", mario())).await;

    let batch = stack
        .broker
        .pull(DEFAULT_SUBSCRIPTION, 10)
        .await
        .expect("pull");
    assert_eq!(batch.len(), 1, "only the site is announced");
    let message = batch.first().expect("message");
    assert_eq!(message.data, b"Via Roma".to_vec());
    assert_eq!(
        message.attributes.get("cap").map(String::as_str),
        Some("20100")
    );

    let quiet = tokio::time::timeout(
        Duration::from_secs(5),
        stack.broker.pull(DEFAULT_SUBSCRIPTION, 10),
    )
    .await
    .expect("pull returns")
    .expect("pull");
    assert!(quiet.is_empty(), "no second message");
}

#[actix_web::test]
async fn search_lists_matching_records() {
    let stack = Stack::new();
    call(&stack, post("/api/v1/cantiere/1", via_roma())).await;
    call(&stack, post("/api/v1/umarell/1", mario())).await;
    call(
        &stack,
        post(
            "/api/v1/cantiere/2",
            json!({"address": "Corso Como", "postalCode": 20154}),
        ),
    )
    .await;

    let (_, sites) = call(
        &stack,
        get("/api/v1/search?postalCode=20100&includeSites=true"),
    )
    .await;
    assert_eq!(sites, json!({"results": ["Via Roma"]}));

    let (_, both) = call(
        &stack,
        get("/api/v1/search?postalCode=20100&includeWatchers=on&includeSites=on"),
    )
    .await;
    assert_eq!(both, json!({"results": ["Mario Rossi", "Via Roma"]}));

    let (_, none) = call(&stack, get("/api/v1/search?postalCode=20100")).await;
    assert_eq!(none, json!({"results": []}));
}

#[actix_web::test]
async fn search_form_renders_results() {
    let stack = Stack::new();
    call(&stack, post("/api/v1/cantiere/1", via_roma())).await;

    let app = test::init_service(stack.app()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload("postalCode=20100&includeSites=on")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).expect("utf8");
    assert!(body.contains("Via Roma"));
}

#[actix_web::test]
async fn clean_empties_both_collections_and_is_repeatable() {
    let stack = Stack::new();
    call(&stack, post("/api/v1/cantiere/1", via_roma())).await;
    call(&stack, post("/api/v1/umarell/1", mario())).await;

    let (first, body) = call(&stack, get("/api/v1/clean")).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(body, Value::Null);
    let (second, _) = call(&stack, get("/api/v1/clean")).await;
    assert_eq!(second, StatusCode::OK);

    for uri in ["/api/v1/cantiere/1", "/api/v1/umarell/1"] {
        let (status, _) = call(&stack, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
