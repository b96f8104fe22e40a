//! Onboarding gate for in-person payments.
//!
//! Before the reader connection flow starts, the merchant's payment account
//! has to be ready for card-present payments. [`OnboardingReadinessGate`]
//! lets the flow proceed right away when it is, and otherwise shows
//! onboarding and resumes the flow once readiness is reached.
//!
//! ```no_run
//! use cardpay_onboarding::{
//!     OnboardingPresenter, OnboardingReadiness, OnboardingReadinessGate, ProceedOutcome,
//! };
//!
//! struct Screen;
//!
//! impl OnboardingPresenter for Screen {
//!     fn present_onboarding(&mut self, readiness: &OnboardingReadiness) {
//!         println!("finish setup: {}", readiness);
//!     }
//!     fn dismiss_onboarding(&mut self) {}
//! }
//!
//! # async fn example() {
//! let mut gate = OnboardingReadinessGate::new(Screen, OnboardingReadiness::default());
//!
//! if let ProceedOutcome::Deferred(pending) = gate.check_and_proceed(|| println!("collect payment")) {
//!     gate.publish(OnboardingReadiness::Ready);
//!     assert!(pending.finished().await);
//! }
//! # }
//! ```

pub mod gate;
pub mod readiness;

pub use gate::{DeferredProceed, OnboardingPresenter, OnboardingReadinessGate, ProceedOutcome};
pub use readiness::{OnboardingReadiness, ReadinessReason};
