//! Integration tests for PaymentGatewayAccountCoordinator
//!
//! The remote is a scripted in-process mock; the cache is a real in-memory
//! SQLite database with migrations applied.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cardpay_core::{GatewayId, OrderId, PaymentIntentId, SiteId};
use cardpay_payments::{
    AccountLoadError, AccountPayload, AccountStatus, CaptureError, Database, IntentStatus,
    PaymentCaptureRequest, PaymentGatewayAccountCoordinator, PaymentGatewayAccountRepository,
    PaymentIntent, PaymentRemote, RemoteError, RemoteResult, SqlitePaymentGatewayAccountRepository,
};
use rstest::rstest;

#[derive(Debug, Clone)]
enum AccountAnswer {
    Account(AccountPayload),
    NotFound,
    ServerError,
}

#[derive(Debug, Clone)]
enum CaptureAnswer {
    Intent(IntentStatus),
    ServerError,
}

struct ScriptedRemote {
    account: Mutex<AccountAnswer>,
    capture: Mutex<CaptureAnswer>,
    captures: AtomicUsize,
    last_capture: Mutex<Option<PaymentCaptureRequest>>,
}

impl ScriptedRemote {
    fn new() -> Self {
        Self {
            account: Mutex::new(AccountAnswer::NotFound),
            capture: Mutex::new(CaptureAnswer::Intent(IntentStatus::Succeeded)),
            captures: AtomicUsize::new(0),
            last_capture: Mutex::new(None),
        }
    }

    fn answer_account(&self, answer: AccountAnswer) {
        *self.account.lock().unwrap() = answer;
    }

    fn answer_capture(&self, answer: CaptureAnswer) {
        *self.capture.lock().unwrap() = answer;
    }
}

fn server_error() -> RemoteError {
    RemoteError::Status {
        status: 500,
        body: "internal error".to_string(),
    }
}

impl PaymentRemote for ScriptedRemote {
    async fn load_account(&self, _site_id: SiteId) -> RemoteResult<AccountPayload> {
        match self.account.lock().unwrap().clone() {
            AccountAnswer::Account(payload) => Ok(payload),
            AccountAnswer::NotFound => Err(RemoteError::NotFound),
            AccountAnswer::ServerError => Err(server_error()),
        }
    }

    async fn capture_payment(&self, request: &PaymentCaptureRequest) -> RemoteResult<PaymentIntent> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        *self.last_capture.lock().unwrap() = Some(request.clone());

        match self.capture.lock().unwrap().clone() {
            CaptureAnswer::Intent(status) => Ok(PaymentIntent {
                id: request.payment_intent_id.to_string(),
                status,
            }),
            CaptureAnswer::ServerError => Err(server_error()),
        }
    }
}

type Coordinator = PaymentGatewayAccountCoordinator<ScriptedRemote, SqlitePaymentGatewayAccountRepository>;

async fn coordinator() -> Coordinator {
    let db = Database::in_memory().await.unwrap();
    PaymentGatewayAccountCoordinator::new(
        ScriptedRemote::new(),
        SqlitePaymentGatewayAccountRepository::new(db.pool().clone()),
    )
}

fn payload(status: &str) -> AccountPayload {
    serde_json::from_value(serde_json::json!({
        "status": status,
        "statement_descriptor": "STORE",
        "store_currencies": { "default": "usd", "supported": ["usd"] },
        "country": "US",
        "card_present_eligible": true,
        "is_live": true,
        "test_mode": false
    }))
    .unwrap()
}

fn site(id: i64) -> SiteId {
    SiteId::new(id).unwrap()
}

#[tokio::test]
async fn test_load_account_stores_account() {
    let coordinator = coordinator().await;
    coordinator
        .remote()
        .answer_account(AccountAnswer::Account(payload("complete")));

    coordinator.load_account(site(1)).await.unwrap();

    let account = coordinator.account(site(1)).await.unwrap().unwrap();
    assert_eq!(account.site_id, site(1));
    assert_eq!(account.gateway_id, GatewayId::wcpay());
    assert_eq!(account.status, AccountStatus::Complete);
    assert!(account.is_card_present_eligible);
}

#[tokio::test]
async fn test_reload_updates_in_place() {
    let coordinator = coordinator().await;
    let remote = coordinator.remote();

    remote.answer_account(AccountAnswer::Account(payload("complete")));
    coordinator.load_account(site(1)).await.unwrap();
    remote.answer_account(AccountAnswer::Account(payload("restricted")));
    coordinator.load_account(site(1)).await.unwrap();

    let accounts = coordinator.repository().find_by_site(site(1)).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].status, AccountStatus::Restricted);
}

#[rstest]
#[case::not_found(AccountAnswer::NotFound)]
#[case::server_error(AccountAnswer::ServerError)]
#[tokio::test]
async fn test_failed_load_deletes_cached_account(#[case] failure: AccountAnswer) {
    let coordinator = coordinator().await;
    let remote = coordinator.remote();

    remote.answer_account(AccountAnswer::Account(payload("complete")));
    coordinator.load_account(site(1)).await.unwrap();
    coordinator.load_account(site(2)).await.unwrap();

    remote.answer_account(failure);
    assert!(coordinator.load_account(site(1)).await.is_err());

    assert!(coordinator.account(site(1)).await.unwrap().is_none());
    // Other sites are untouched
    assert!(coordinator.account(site(2)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_load_errors_are_classified() {
    let coordinator = coordinator().await;

    coordinator.remote().answer_account(AccountAnswer::NotFound);
    assert!(matches!(
        coordinator.load_account(site(3)).await,
        Err(AccountLoadError::NotFound)
    ));

    coordinator.remote().answer_account(AccountAnswer::ServerError);
    assert!(matches!(
        coordinator.load_account(site(3)).await,
        Err(AccountLoadError::TransportFailure(RemoteError::Status { status: 500, .. }))
    ));
}

#[tokio::test]
async fn test_failed_load_without_cache_is_fine() {
    let coordinator = coordinator().await;
    coordinator.remote().answer_account(AccountAnswer::ServerError);

    assert!(coordinator.load_account(site(5)).await.is_err());
    assert!(coordinator.account(site(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_capture_succeeded() {
    let coordinator = coordinator().await;
    let intent_id = PaymentIntentId::new("pi_ok").unwrap();

    coordinator
        .capture_payment(site(1), OrderId::new(10).unwrap(), &intent_id)
        .await
        .unwrap();

    let request = coordinator.remote().last_capture.lock().unwrap().clone().unwrap();
    assert_eq!(request.site_id, site(1));
    assert_eq!(request.order_id, OrderId::new(10).unwrap());
    assert_eq!(request.payment_intent_id, intent_id);
}

#[rstest]
#[case(IntentStatus::RequiresAction, "requires_action")]
#[case(IntentStatus::RequiresCapture, "requires_capture")]
#[case(IntentStatus::Processing, "processing")]
#[case(IntentStatus::Canceled, "canceled")]
#[case(IntentStatus::Unknown("mystery".to_string()), "mystery")]
#[tokio::test]
async fn test_capture_other_status_is_failure(#[case] status: IntentStatus, #[case] raw: &str) {
    let coordinator = coordinator().await;
    coordinator.remote().answer_capture(CaptureAnswer::Intent(status));

    let result = coordinator
        .capture_payment(site(1), OrderId::new(10).unwrap(), &PaymentIntentId::new("pi_1").unwrap())
        .await;

    match result {
        Err(CaptureError::PaymentCapture { status }) => assert_eq!(status, raw),
        other => panic!("expected capture failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_capture_transport_failure_is_not_retried() {
    let coordinator = coordinator().await;
    coordinator.remote().answer_capture(CaptureAnswer::ServerError);

    let result = coordinator
        .capture_payment(site(1), OrderId::new(10).unwrap(), &PaymentIntentId::new("pi_1").unwrap())
        .await;

    assert!(matches!(result, Err(CaptureError::TransportFailure(_))));
    assert_eq!(coordinator.remote().captures.load(Ordering::SeqCst), 1);
}
