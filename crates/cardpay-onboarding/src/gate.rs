use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cardpay_payments::PaymentGatewayAccount;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use crate::readiness::OnboardingReadiness;

/// UI boundary for the onboarding screen.
pub trait OnboardingPresenter: Send + 'static {
    /// Show onboarding so the merchant can finish setting up payments.
    fn present_onboarding(&mut self, readiness: &OnboardingReadiness);

    /// Hide onboarding after readiness was reached.
    fn dismiss_onboarding(&mut self);
}

/// Result of [`OnboardingReadinessGate::check_and_proceed`].
#[derive(Debug)]
pub enum ProceedOutcome {
    /// The merchant was ready; the action already ran.
    Immediate,
    /// Onboarding is shown; the action runs once readiness is reached.
    Deferred(DeferredProceed),
}

impl ProceedOutcome {
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate)
    }

    pub fn into_deferred(self) -> Option<DeferredProceed> {
        match self {
            Self::Immediate => None,
            Self::Deferred(deferred) => Some(deferred),
        }
    }
}

struct PendingProceed {
    id: u64,
    action: Box<dyn FnOnce() + Send>,
    done: oneshot::Sender<bool>,
}

impl PendingProceed {
    fn abandon(self) {
        let _ = self.done.send(false);
    }
}

type PendingSlot = Arc<Mutex<Option<PendingProceed>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A proceed action waiting for readiness.
///
/// Dropping the handle does not cancel the wait; call [`dismiss`] when the
/// merchant leaves onboarding without finishing it.
///
/// [`dismiss`]: DeferredProceed::dismiss
pub struct DeferredProceed {
    id: u64,
    slot: PendingSlot,
    done: oneshot::Receiver<bool>,
}

impl DeferredProceed {
    /// Onboarding was dismissed by the merchant; the action will not run.
    pub fn dismiss(&self) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|pending| pending.id == self.id)
            && let Some(pending) = slot.take()
        {
            debug!("Onboarding dismissed before readiness");
            pending.abandon();
        }
    }

    /// Whether the action is still waiting.
    pub fn is_pending(&self) -> bool {
        lock(&self.slot)
            .as_ref()
            .is_some_and(|pending| pending.id == self.id)
    }

    /// Wait until the action ran or was abandoned.
    ///
    /// Returns `true` if the action ran.
    pub async fn finished(self) -> bool {
        self.done.await.unwrap_or(false)
    }
}

impl fmt::Debug for DeferredProceed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredProceed")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Guards entry into the payment flow behind onboarding.
///
/// Holds the latest [`OnboardingReadiness`] in a `watch` cell so any number
/// of subscribers see consistent snapshots. At most one proceed action is
/// pending; a newer [`check_and_proceed`] supersedes it.
///
/// The pending action is fired by [`publish`] itself, so a `Ready` that is
/// replaced right away still counts.
///
/// [`check_and_proceed`]: OnboardingReadinessGate::check_and_proceed
/// [`publish`]: OnboardingReadinessGate::publish
pub struct OnboardingReadinessGate<P> {
    sender: watch::Sender<OnboardingReadiness>,
    presenter: Mutex<P>,
    pending: PendingSlot,
    next_id: u64,
}

impl<P: OnboardingPresenter> OnboardingReadinessGate<P> {
    pub fn new(presenter: P, initial: OnboardingReadiness) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            presenter: Mutex::new(presenter),
            pending: PendingSlot::default(),
            next_id: 0,
        }
    }

    /// The latest readiness.
    pub fn readiness(&self) -> OnboardingReadiness {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OnboardingReadiness> {
        self.sender.subscribe()
    }

    /// Replace the latest readiness and notify subscribers.
    ///
    /// When the new value is ready, a pending proceed action runs before
    /// this returns and onboarding is dismissed.
    pub fn publish(&self, readiness: OnboardingReadiness) {
        debug!("Onboarding readiness: {}", readiness);
        let ready = readiness.is_ready();
        self.sender.send_replace(readiness);

        if !ready {
            return;
        }

        let pending = lock(&self.pending).take();
        if let Some(pending) = pending {
            (pending.action)();
            lock(&self.presenter).dismiss_onboarding();
            let _ = pending.done.send(true);
        }
    }

    /// Re-evaluate readiness from the cached account and publish it.
    pub fn publish_account(&self, account: Option<&PaymentGatewayAccount>) -> OnboardingReadiness {
        let readiness = OnboardingReadiness::from_account(account);
        self.publish(readiness.clone());
        readiness
    }

    /// Run `action` now if ready, otherwise present onboarding and run it
    /// the first time readiness becomes [`OnboardingReadiness::Ready`].
    pub fn check_and_proceed<F>(&mut self, action: F) -> ProceedOutcome
    where
        F: FnOnce() + Send + 'static,
    {
        let previous = lock(&self.pending).take();
        if let Some(previous) = previous {
            debug!("Superseding pending proceed action");
            previous.abandon();
        }

        let current = self.readiness();
        if current.is_ready() {
            action();
            return ProceedOutcome::Immediate;
        }

        info!("Presenting onboarding ({})", current);
        lock(&self.presenter).present_onboarding(&current);

        self.next_id += 1;
        let (done, finished) = oneshot::channel();
        *lock(&self.pending) = Some(PendingProceed {
            id: self.next_id,
            action: Box::new(action),
            done,
        });

        ProceedOutcome::Deferred(DeferredProceed {
            id: self.next_id,
            slot: Arc::clone(&self.pending),
            done: finished,
        })
    }

    pub fn presenter(&self) -> MutexGuard<'_, P> {
        lock(&self.presenter)
    }
}

impl<P> Drop for OnboardingReadinessGate<P> {
    fn drop(&mut self) {
        let pending = lock(&self.pending).take();
        if let Some(pending) = pending {
            pending.abandon();
        }
    }
}
