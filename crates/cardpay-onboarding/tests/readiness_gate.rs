//! Integration tests for OnboardingReadinessGate

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cardpay_core::{GatewayId, SiteId};
use cardpay_onboarding::{
    OnboardingPresenter, OnboardingReadiness, OnboardingReadinessGate, ProceedOutcome,
    ReadinessReason,
};
use cardpay_payments::{AccountStatus, PaymentGatewayAccount};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Presented(OnboardingReadiness),
    Dismissed,
    Proceeded(&'static str),
}

type Log = Arc<Mutex<Vec<Event>>>;

struct RecordingPresenter {
    log: Log,
}

impl OnboardingPresenter for RecordingPresenter {
    fn present_onboarding(&mut self, readiness: &OnboardingReadiness) {
        self.log.lock().unwrap().push(Event::Presented(readiness.clone()));
    }

    fn dismiss_onboarding(&mut self) {
        self.log.lock().unwrap().push(Event::Dismissed);
    }
}

fn gate(initial: OnboardingReadiness) -> (OnboardingReadinessGate<RecordingPresenter>, Log) {
    let log = Log::default();
    let presenter = RecordingPresenter { log: log.clone() };
    (OnboardingReadinessGate::new(presenter, initial), log)
}

fn proceed(log: &Log, name: &'static str) -> impl FnOnce() + Send + 'static {
    let log = log.clone();
    move || log.lock().unwrap().push(Event::Proceeded(name))
}

fn events(log: &Log) -> Vec<Event> {
    log.lock().unwrap().clone()
}

fn not_ready() -> OnboardingReadiness {
    OnboardingReadiness::NotReady(ReadinessReason::NoAccount)
}

fn pending() -> OnboardingReadiness {
    OnboardingReadiness::Pending(ReadinessReason::PendingRequirements { deadline: None })
}

#[tokio::test]
async fn test_ready_proceeds_immediately() {
    let (mut gate, log) = gate(OnboardingReadiness::Ready);

    let outcome = gate.check_and_proceed(proceed(&log, "collect"));

    assert!(outcome.is_immediate());
    assert_eq!(events(&log), vec![Event::Proceeded("collect")]);
}

#[tokio::test]
async fn test_not_ready_defers_until_ready() {
    let (mut gate, log) = gate(not_ready());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();
    assert_eq!(events(&log), vec![Event::Presented(not_ready())]);

    gate.publish(pending());
    tokio::task::yield_now().await;
    assert!(deferred.is_pending());

    gate.publish(OnboardingReadiness::Ready);
    assert!(deferred.finished().await);

    assert_eq!(
        events(&log),
        vec![
            Event::Presented(not_ready()),
            Event::Proceeded("collect"),
            Event::Dismissed,
        ]
    );
}

#[tokio::test]
async fn test_flapping_readiness_runs_action_once() {
    let (mut gate, log) = gate(not_ready());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();

    gate.publish(OnboardingReadiness::Ready);
    assert!(deferred.finished().await);

    gate.publish(not_ready());
    gate.publish(OnboardingReadiness::Ready);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let proceeded = events(&log)
        .into_iter()
        .filter(|e| matches!(e, Event::Proceeded(_)))
        .count();
    assert_eq!(proceeded, 1);
}

#[tokio::test]
async fn test_dismissed_onboarding_never_proceeds() {
    let (mut gate, log) = gate(not_ready());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();

    deferred.dismiss();
    gate.publish(OnboardingReadiness::Ready);

    assert!(!deferred.finished().await);
    assert_eq!(events(&log), vec![Event::Presented(not_ready())]);
}

#[tokio::test]
async fn test_newer_check_supersedes_pending_one() {
    let (mut gate, log) = gate(not_ready());

    let first = gate
        .check_and_proceed(proceed(&log, "first"))
        .into_deferred()
        .unwrap();
    let second = gate
        .check_and_proceed(proceed(&log, "second"))
        .into_deferred()
        .unwrap();

    assert!(!first.finished().await);

    gate.publish(OnboardingReadiness::Ready);
    assert!(second.finished().await);

    let proceeded: Vec<_> = events(&log)
        .into_iter()
        .filter(|e| matches!(e, Event::Proceeded(_)))
        .collect();
    assert_eq!(proceeded, vec![Event::Proceeded("second")]);
}

#[tokio::test]
async fn test_ready_check_supersedes_pending_one() {
    let (mut gate, log) = gate(not_ready());

    let first = gate
        .check_and_proceed(proceed(&log, "first"))
        .into_deferred()
        .unwrap();

    gate.publish(OnboardingReadiness::Ready);
    let outcome = gate.check_and_proceed(proceed(&log, "second"));

    assert!(matches!(outcome, ProceedOutcome::Immediate));
    assert!(first.finished().await);
    assert_eq!(
        events(&log),
        vec![
            Event::Presented(not_ready()),
            Event::Proceeded("first"),
            Event::Dismissed,
            Event::Proceeded("second"),
        ]
    );
}

#[tokio::test]
async fn test_brief_ready_still_proceeds() {
    let (mut gate, log) = gate(pending());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();

    gate.publish(OnboardingReadiness::Ready);
    gate.publish(pending());

    assert!(!deferred.is_pending());
    assert!(deferred.finished().await);
    assert_eq!(
        events(&log),
        vec![
            Event::Presented(pending()),
            Event::Proceeded("collect"),
            Event::Dismissed,
        ]
    );
    assert_eq!(gate.readiness(), pending());
}

#[test]
fn test_publish_runs_action_without_runtime() {
    let (mut gate, log) = gate(not_ready());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();
    assert!(deferred.is_pending());

    gate.publish(OnboardingReadiness::Ready);

    assert!(!deferred.is_pending());
    assert_eq!(
        events(&log),
        vec![
            Event::Presented(not_ready()),
            Event::Proceeded("collect"),
            Event::Dismissed,
        ]
    );
}

#[tokio::test]
async fn test_dropped_gate_abandons_pending_action() {
    let (mut gate, log) = gate(not_ready());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();
    drop(gate);

    assert!(!deferred.is_pending());
    assert!(!deferred.finished().await);
    assert_eq!(events(&log), vec![Event::Presented(not_ready())]);
}

#[tokio::test]
async fn test_subscribers_see_latest_value() {
    let (gate, _log) = gate(not_ready());
    let mut first = gate.subscribe();
    let mut second = gate.subscribe();

    gate.publish(pending());
    gate.publish(OnboardingReadiness::Ready);

    first.changed().await.unwrap();
    second.changed().await.unwrap();
    assert_eq!(*first.borrow_and_update(), OnboardingReadiness::Ready);
    assert_eq!(*second.borrow_and_update(), OnboardingReadiness::Ready);
    assert_eq!(gate.readiness(), OnboardingReadiness::Ready);
}

#[tokio::test]
async fn test_publish_account_resumes_flow() {
    let (mut gate, log) = gate(OnboardingReadiness::default());

    let deferred = gate
        .check_and_proceed(proceed(&log, "collect"))
        .into_deferred()
        .unwrap();

    let account = PaymentGatewayAccount::new(SiteId::new(3).unwrap(), GatewayId::wcpay())
        .with_status(AccountStatus::Complete)
        .with_card_present_eligible(true);
    let readiness = gate.publish_account(Some(&account));

    assert_eq!(readiness, OnboardingReadiness::Ready);
    assert!(deferred.finished().await);
}
