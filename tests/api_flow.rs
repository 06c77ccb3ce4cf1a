//! HTTP-level flows through the full router: accounts, balance updates,
//! transfers, replays, and the error envelope.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use moneyflow::config::CompensationConfig;
use moneyflow::http::{AppState, CORRELATION_HEADER, router};
use moneyflow::ledger::store::MemAccountStore;
use moneyflow::ledger::LedgerService;
use moneyflow::transfer::store::MemTransferStore;
use moneyflow::transfer::{LocalLedgerClient, TransferOrchestrator};

fn app() -> Router {
    let ledger = Arc::new(LedgerService::new(Arc::new(MemAccountStore::new())));
    let orchestrator = Arc::new(TransferOrchestrator::new(
        Arc::new(MemTransferStore::new()),
        Arc::new(LocalLedgerClient::new(ledger.clone())),
        CompensationConfig {
            max_attempts: 3,
            retry_delay_ms: 1,
        },
    ));
    router(Arc::new(AppState::new(ledger, orchestrator)))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_account(app: &Router, owner: &str) -> i64 {
    let (status, body) = send(app, json_req("POST", "/accounts", json!({"owner": owner}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn fund(app: &Router, id: i64, amount: &str, key: &str) {
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/accounts/{id}/balance"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("Idempotency-Key", key)
        .body(Body::from(json!({"delta": amount}).to_string()))
        .unwrap();
    let (status, _) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
}

async fn balance(app: &Router, id: i64) -> String {
    let (status, body) = send(
        app,
        Request::builder()
            .method("GET")
            .uri(format!("/accounts/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["balance"].as_str().unwrap().to_string()
}

fn transfer_req(from: i64, to: i64, amount: &str, key: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/transfers")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Idempotency-Key", key)
        .header(header::AUTHORIZATION, "Bearer test-token")
        .body(Body::from(
            json!({"fromAccountId": from, "toAccountId": to, "amount": amount}).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_balance_update_and_duplicate_conflict() {
    let app = app();
    let a = create_account(&app, "alice").await;

    fund(&app, a, "100", "seed").await;
    assert_eq!(balance(&app, a).await, "100");

    // Same key again: 409 and no balance change.
    let req = Request::builder()
        .method("PUT")
        .uri(format!("/accounts/{a}/balance"))
        .header(header::CONTENT_TYPE, "application/json")
        .header("Idempotency-Key", "seed")
        .body(Body::from(json!({"delta": "100"}).to_string()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE_REQUEST");
    assert_eq!(balance(&app, a).await, "100");
}

#[tokio::test]
async fn test_balance_update_requires_idempotency_key() {
    let app = app();
    let a = create_account(&app, "alice").await;

    let req = json_req(
        "PUT",
        &format!("/accounts/{a}/balance"),
        json!({"delta": "10"}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_IDEMPOTENCY_KEY");
}

#[tokio::test]
async fn test_transfer_flow_and_replay() {
    let app = app();
    let a = create_account(&app, "alice").await;
    let b = create_account(&app, "bob").await;
    fund(&app, a, "100", "seed-a").await;

    let (status, body) = send(&app, transfer_req(a, b, "40", "K1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Completed");
    let transfer_id = body["id"].as_str().unwrap().to_string();

    assert_eq!(balance(&app, a).await, "60");
    assert_eq!(balance(&app, b).await, "40");

    // Replay: 200, same record, no further movement.
    let (status, body) = send(&app, transfer_req(a, b, "40", "K1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], transfer_id.as_str());
    assert_eq!(balance(&app, a).await, "60");
    assert_eq!(balance(&app, b).await, "40");

    // Record is readable by id.
    let (status, body) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri(format!("/transfers/{transfer_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Completed");
}

#[tokio::test]
async fn test_transfer_missing_idempotency_key() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/transfers")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer t")
        .body(Body::from(
            json!({"fromAccountId": 1, "toAccountId": 2, "amount": "5"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_IDEMPOTENCY_KEY");
}

#[tokio::test]
async fn test_transfer_requires_bearer_token() {
    let app = app();
    let req = Request::builder()
        .method("POST")
        .uri("/transfers")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Idempotency-Key", "K1")
        .body(Body::from(
            json!({"fromAccountId": 1, "toAccountId": 2, "amount": "5"}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_transfer_insufficient_funds() {
    let app = app();
    let a = create_account(&app, "alice").await;
    let b = create_account(&app, "bob").await;
    fund(&app, a, "30", "seed-a").await;

    let (status, body) = send(&app, transfer_req(a, b, "40", "K1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_FUNDS");
    assert_eq!(balance(&app, a).await, "30");
    assert_eq!(balance(&app, b).await, "0");
}

#[tokio::test]
async fn test_transfer_to_missing_account_compensates() {
    let app = app();
    let a = create_account(&app, "alice").await;
    fund(&app, a, "100", "seed-a").await;

    let (status, body) = send(&app, transfer_req(a, a + 999, "40", "K1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ACCOUNT_NOT_FOUND");
    // The debit was reversed.
    assert_eq!(balance(&app, a).await, "100");

    let (status, body) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/transfers")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "Failed");
}

#[tokio::test]
async fn test_get_transfer_bad_id_is_404() {
    let app = app();
    let (status, body) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/transfers/not-a-ulid")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TRANSFER_NOT_FOUND");
}

#[tokio::test]
async fn test_correlation_id_echo() {
    let app = app();

    // Caller-supplied id comes back unchanged.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/accounts")
                .header(CORRELATION_HEADER, "corr-abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get(CORRELATION_HEADER).unwrap(),
        "corr-abc"
    );

    // Absent id gets generated.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/accounts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.headers().contains_key(CORRELATION_HEADER));
}

#[tokio::test]
async fn test_account_not_found_envelope() {
    let app = app();
    let (status, body) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/accounts/999")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ACCOUNT_NOT_FOUND");
}
