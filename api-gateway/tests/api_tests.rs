use std::sync::Arc;
use std::time::Duration;

use api_gateway::{router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::decimal::Amount;
use common::error::{Error, Result};
use serde_json::{json, Value};
use tower::ServiceExt;
use wallet_service::{InMemoryBalanceCache, LedgerStore, WalletService};

/// Ledger store whose backing database is down
struct UnavailableStore;

#[async_trait]
impl LedgerStore for UnavailableStore {
    async fn apply_delta(&self, _wallet_id: &str, _delta: Amount) -> Result<Amount> {
        Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut))
    }

    async fn get_balance(&self, _wallet_id: &str) -> Result<Amount> {
        Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut))
    }
}

fn app_with(service: WalletService) -> Router {
    let state = Arc::new(AppState {
        wallet_service: Arc::new(service),
    });
    router(state, Duration::from_secs(5))
}

fn post_wallet(body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/wallet")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

fn get_wallet(wallet_id: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/v1/wallets/{}", wallet_id))
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_wallet_scenarios() {
    let app = app_with(WalletService::in_memory());

    // (a) deposit on a new wallet
    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"A1","operationType":"DEPOSIT","amount":100}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"walletId": "A1", "balance": 100.0}));

    // (b) overdraw is rejected and leaves the balance unchanged
    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"A1","operationType":"WITHDRAW","amount":150}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "insufficient_funds");

    let (status, body) = send(&app, get_wallet("A1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"walletId": "A1", "balance": 100.0}));

    // (c) withdraw down to zero
    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"A1","operationType":"WITHDRAW","amount":100}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"walletId": "A1", "balance": 0.0}));

    // (d) read reflects the withdrawal despite the earlier cached read
    let (status, body) = send(&app, get_wallet("A1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"walletId": "A1", "balance": 0.0}));

    // (e) unknown wallet
    let (status, body) = send(&app, get_wallet("ZZZ")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "wallet_not_found");

    // (f) unknown operation type
    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"A1","operationType":"TRANSFER","amount":10}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_fractional_amounts() {
    let app = app_with(WalletService::in_memory());

    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"F1","operationType":"DEPOSIT","amount":10.75}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 10.75);

    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"F1","operationType":"WITHDRAW","amount":0.25}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 10.5);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = app_with(WalletService::in_memory());

    let bodies = [
        "not json",
        r#"{"walletId":"A1","operationType":"DEPOSIT"}"#,
        r#"{"walletId":"A1","operationType":"DEPOSIT","amount":"lots"}"#,
        r#"{"walletId":"A1","operationType":"DEPOSIT","amount":-5}"#,
        r#"{"walletId":"A1","operationType":"DEPOSIT","amount":0}"#,
        r#"{"walletId":"","operationType":"DEPOSIT","amount":5}"#,
    ];

    for body in bodies {
        let (status, response) = send(&app, post_wallet(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {} should be rejected", body);
        assert!(response["request_id"].is_string());
    }

    // Nothing was created along the way
    let (status, _) = send(&app, get_wallet("A1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let app = app_with(WalletService::in_memory());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/wallet")
        .body(Body::from(r#"{"walletId":"A1","operationType":"DEPOSIT","amount":1}"#))
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    let service = WalletService::new(
        Arc::new(UnavailableStore),
        Arc::new(InMemoryBalanceCache::new()),
        Duration::from_secs(300),
    );
    let app = app_with(service);

    let (status, body) = send(
        &app,
        post_wallet(r#"{"walletId":"A1","operationType":"DEPOSIT","amount":1}"#),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "store_unavailable");
    assert_eq!(body["error"]["message"], "internal server error");

    let (status, _) = send(&app, get_wallet("A1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_openapi_document_lists_wallet_routes() {
    let app = app_with(WalletService::in_memory());

    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/wallet"]["post"].is_object());
    assert!(body["paths"]["/api/v1/wallets/{walletId}"]["get"].is_object());
}
