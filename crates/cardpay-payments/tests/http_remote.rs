//! Integration tests for HttpPaymentRemote
//!
//! Responses come from a local mockito server; each mock asserts the method,
//! path and body the client sent.

use std::time::Duration;

use cardpay_core::{OrderId, PaymentIntentId, SiteId};
use cardpay_payments::{
    AccountStatus, CaptureError, Database, HttpPaymentRemote, IntentStatus,
    PaymentCaptureRequest, PaymentGatewayAccountCoordinator, PaymentRemote, RemoteConfig,
    RemoteError, SqlitePaymentGatewayAccountRepository,
};
use mockito::{Matcher, Server};
use serde_json::json;

const ACCOUNT_PATH: &str = "/wc/v3/sites/77/payments/accounts";
const CAPTURE_PATH: &str = "/wc/v3/sites/77/payments/orders/1001/capture_terminal_payment";

fn remote(base: &str) -> HttpPaymentRemote {
    let config = RemoteConfig::new(format!("{}/wc/v3", base))
        .timeout(Duration::from_secs(2))
        .connect_timeout(Duration::from_secs(1));
    HttpPaymentRemote::new(config).unwrap()
}

fn site() -> SiteId {
    SiteId::new(77).unwrap()
}

fn capture_request() -> PaymentCaptureRequest {
    PaymentCaptureRequest::new(
        site(),
        OrderId::new(1001).unwrap(),
        PaymentIntentId::new("pi_abc").unwrap(),
    )
}

fn capture_body() -> Matcher {
    Matcher::Json(json!({ "payment_intent_id": "pi_abc" }))
}

#[tokio::test]
async fn test_load_account() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", ACCOUNT_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "complete",
                "has_pending_requirements": true,
                "store_currencies": { "default": "eur", "supported": ["eur"] },
                "country": "IE",
                "card_present_eligible": true,
                "is_live": false,
                "test_mode": true
            })
            .to_string(),
        )
        .create_async()
        .await;

    let payload = remote(&server.url()).load_account(site()).await.unwrap();
    mock.assert_async().await;

    let account = payload.into_account(site());
    assert_eq!(account.status, AccountStatus::Complete);
    assert!(account.has_pending_requirements);
    assert_eq!(account.default_currency, "eur");
    assert!(account.is_in_test_mode);
}

#[tokio::test]
async fn test_load_account_not_found_status() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", ACCOUNT_PATH)
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(json!({ "code": "rest_no_route" }).to_string())
        .create_async()
        .await;

    let result = remote(&server.url()).load_account(site()).await;

    mock.assert_async().await;
    assert!(matches!(result, Err(RemoteError::NotFound)));
}

#[tokio::test]
async fn test_load_account_empty_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", ACCOUNT_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let result = remote(&server.url()).load_account(site()).await;

    mock.assert_async().await;
    assert!(matches!(result, Err(RemoteError::NotFound)));
}

#[tokio::test]
async fn test_server_error_is_status() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", ACCOUNT_PATH)
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(json!({ "code": "boom" }).to_string())
        .create_async()
        .await;

    let result = remote(&server.url()).load_account(site()).await;
    mock.assert_async().await;

    match result {
        Err(RemoteError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_capture_posts_intent_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", CAPTURE_PATH)
        .match_header("content-type", "application/json")
        .match_body(capture_body())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "pi_abc", "status": "succeeded" }).to_string())
        .create_async()
        .await;

    let intent = remote(&server.url())
        .capture_payment(&capture_request())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(intent.id, "pi_abc");
    assert_eq!(intent.status, IntentStatus::Succeeded);
}

#[tokio::test]
async fn test_capture_undecodable_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", CAPTURE_PATH)
        .match_body(capture_body())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "unexpected": true }).to_string())
        .create_async()
        .await;

    let result = remote(&server.url()).capture_payment(&capture_request()).await;

    mock.assert_async().await;
    assert!(matches!(result, Err(RemoteError::Decode(_))));
}

#[tokio::test]
async fn test_capture_requires_action_is_capture_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", CAPTURE_PATH)
        .match_body(capture_body())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": "pi_1", "status": "requires_action" }).to_string())
        .create_async()
        .await;

    let db = Database::in_memory().await.unwrap();
    let coordinator = PaymentGatewayAccountCoordinator::new(
        remote(&server.url()),
        SqlitePaymentGatewayAccountRepository::new(db.pool().clone()),
    );

    let result = coordinator
        .capture_payment(
            site(),
            OrderId::new(1001).unwrap(),
            &PaymentIntentId::new("pi_abc").unwrap(),
        )
        .await;

    mock.assert_async().await;
    match result {
        Err(CaptureError::PaymentCapture { status }) => assert_eq!(status, "requires_action"),
        other => panic!("expected capture failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_http_error() {
    // Bind and drop to get a port nobody listens on
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let result = remote(&format!("http://{}", addr)).load_account(site()).await;
    assert!(matches!(result, Err(RemoteError::Http(_))));
}
