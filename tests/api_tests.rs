//! HTTP-level tests for request validation
//!
//! The pool is created lazily and these requests are all rejected before a
//! connection is needed, so no database has to be running.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use goldshop_server::config::{Config, Environment};
use goldshop_server::routes;
use goldshop_server::state::AppState;

fn test_config(environment: Environment) -> Config {
    Config {
        database_url: "postgresql://localhost/goldshop_unreachable".to_string(),
        environment,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        db_max_connections: 1,
        cors_allowed_origins: None,
        log_level: "warn".to_string(),
        run_migrations: false,
    }
}

fn app_for(environment: Environment) -> Router {
    let config = test_config(environment);
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    routes::app(AppState::new(pool), &config)
}

fn app() -> Router {
    app_for(Environment::Development)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_banner_and_headers() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    assert!(!response.headers().contains_key("strict-transport-security"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"Gold Shop Management System Backend");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-request-id", "counter-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "counter-7");
}

#[tokio::test]
async fn test_hsts_only_in_production() {
    let response = app_for(Environment::Production)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("strict-transport-security"));
}

#[tokio::test]
async fn test_unknown_loan_status_filter_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/gold-loans?status=pending")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_status_update_is_rejected() {
    let uri = format!("/api/gold-loans/{}/status", Uuid::new_v4());
    let response = app()
        .oneshot(json_request("PUT", &uri, json!({ "status": "archived" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_over_leveraged_loan_is_rejected_with_limits() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/gold-loans",
            json!({
                "customerId": Uuid::new_v4(),
                "loanAmount": 100001.0,
                "interestRate": 12.0,
                "duration": 12,
                "items": [{
                    "itemType": "Gold",
                    "weight": 50.0,
                    "purity": 22.0,
                    "marketValue": 125000.0
                }]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["maxLoanAmount"], 100000.0);
    assert_eq!(body["error"]["details"]["totalItemsValue"], 125000.0);
}

#[tokio::test]
async fn test_invoice_total_mismatch_reports_calculated_total() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/invoices",
            json!({
                "customerId": Uuid::new_v4(),
                "items": [{ "name": "Bangle", "weight": 10.0, "rate": 6000.0, "makingCharge": 2500.0 }],
                "totalAmount": 64000.0,
                "paidAmount": 10000.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["calculated"], 64375.0);
    assert_eq!(body["error"]["details"]["provided"], 64000.0);
}

#[tokio::test]
async fn test_customer_with_bad_mobile_is_rejected() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/customers",
            json!({ "name": "Lakshmi", "mobile": "98765" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_id_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/customers/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_stock_status_filter_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/inventory?status=sold")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_enum_in_body_uses_error_body() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/api/inventory",
            json!({
                "name": "Chain",
                "itemType": "Copper",
                "category": "Chain",
                "weight": 12.0,
                "purity": 22.0,
                "quantity": 1
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("itemType"));
}

#[tokio::test]
async fn test_missing_body_field_uses_error_body() {
    let uri = format!("/api/gold-loans/{}/repayment", Uuid::new_v4());
    let response = app()
        .oneshot(json_request("POST", &uri, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/customers")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
