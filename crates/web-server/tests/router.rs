use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use configuration::Settings;
use database::DbRepository;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use web_server::{build_router, AppState};

// Nothing listens on this address; the pool only connects when a query runs,
// so every request below must be answered before touching the database.
const UNREACHABLE_DB: &str = "postgres://brokerwatch@127.0.0.1:1/brokerwatch";

fn app() -> Router {
    let mut settings = Settings::default();
    settings.database.url = Some(UNREACHABLE_DB.to_string());
    let pool = database::connect_lazy(&settings.database).expect("lazy pool");
    let state = AppState::new(DbRepository::new(pool), &settings).expect("state");
    build_router(Arc::new(state), &settings.server)
}

async fn error_message(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_answers_without_identity() {
    let response = app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let response = app()
        .oneshot(Request::builder().uri("/api/accounts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(error_message(response).await.contains("x-user-id"));
}

#[tokio::test]
async fn non_numeric_identity_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/strategies")
                .header("x-user-id", "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inverted_value_range_is_a_bad_request() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/accounts/1/values?start_date=2024-02-01&end_date=2024-01-01")
                .header("x-user-id", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("2024-02-01"));
}

#[tokio::test]
async fn unparseable_dates_are_bad_requests() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/strategies/3/performance?start_date=last-week")
                .header("x-user-id", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_account_ids_are_bad_requests() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/accounts/main/transactions")
                .header("x-user-id", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn accounts_need_a_valid_currency() {
    let body = r#"{"account_name": "Main", "broker_account_id": "ABC123", "currency": "EURO"}"#;
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/accounts")
                .header("x-user-id", "1")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("currency"));
}

#[tokio::test]
async fn accounts_need_a_known_timezone() {
    let body = r#"{"account_name": "Main", "broker_account_id": "ABC123", "currency": "EUR", "timezone": "Mars/Olympus"}"#;
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/accounts")
                .header("x-user-id", "1")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_bodies_are_bad_requests() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/accounts/1/values")
                .header("x-user-id", "1")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"value": "a lot"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn identity_header_name_is_configurable() {
    let mut settings = Settings::default();
    settings.database.url = Some(UNREACHABLE_DB.to_string());
    settings.auth.identity_header = "X-Forwarded-User".to_string();
    let pool = database::connect_lazy(&settings.database).unwrap();
    let state = AppState::new(DbRepository::new(pool), &settings).unwrap();
    let app = build_router(Arc::new(state), &settings.server);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/accounts/1/values?start_date=2024-02-01&end_date=2024-01-01")
                .header("x-user-id", "1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
