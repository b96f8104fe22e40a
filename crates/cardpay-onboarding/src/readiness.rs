use std::fmt;

use cardpay_payments::{AccountStatus, PaymentGatewayAccount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why card-present payments are not available yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReadinessReason {
    /// No payment gateway account is known for the site.
    NoAccount,
    /// The processor rejected the account.
    AccountRejected { status: String },
    /// The account cannot take payments until requirements are met.
    AccountRestricted,
    /// Requirements are past their deadline.
    OverdueRequirements,
    /// Requirements are due, payments are still possible until the deadline.
    PendingRequirements { deadline: Option<DateTime<Utc>> },
    /// The account's country or setup does not support card-present payments.
    NotEligible,
    /// The processor reported a status this client does not know.
    UnsupportedStatus { status: String },
    /// Readiness has not been evaluated yet.
    Unknown,
}

impl fmt::Display for ReadinessReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAccount => write!(f, "no payment account"),
            Self::AccountRejected { status } => write!(f, "account rejected ({})", status),
            Self::AccountRestricted => write!(f, "account restricted"),
            Self::OverdueRequirements => write!(f, "account requirements overdue"),
            Self::PendingRequirements { deadline: Some(deadline) } => {
                write!(f, "account requirements due by {}", deadline.format("%Y-%m-%d"))
            }
            Self::PendingRequirements { deadline: None } => write!(f, "account requirements due"),
            Self::NotEligible => write!(f, "not eligible for in-person payments"),
            Self::UnsupportedStatus { status } => write!(f, "unsupported account status {}", status),
            Self::Unknown => write!(f, "readiness unknown"),
        }
    }
}

/// Whether the merchant can take a card-present payment.
///
/// ```
/// use cardpay_onboarding::{OnboardingReadiness, ReadinessReason};
///
/// let readiness = OnboardingReadiness::from_account(None);
/// assert_eq!(readiness, OnboardingReadiness::NotReady(ReadinessReason::NoAccount));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "readiness", content = "detail", rename_all = "snake_case")]
pub enum OnboardingReadiness {
    Ready,
    Pending(ReadinessReason),
    NotReady(ReadinessReason),
}

impl OnboardingReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn reason(&self) -> Option<&ReadinessReason> {
        match self {
            Self::Ready => None,
            Self::Pending(reason) | Self::NotReady(reason) => Some(reason),
        }
    }

    /// Evaluate readiness from the cached payment gateway account.
    ///
    /// Checks run in order and the first one that applies wins: account
    /// presence, rejection, overdue requirements, card-present eligibility,
    /// restriction, pending requirements, and finally the status itself.
    pub fn from_account(account: Option<&PaymentGatewayAccount>) -> Self {
        let Some(account) = account else {
            return Self::NotReady(ReadinessReason::NoAccount);
        };

        if account.status == AccountStatus::NoAccount {
            return Self::NotReady(ReadinessReason::NoAccount);
        }

        if account.status.is_rejected() {
            return Self::NotReady(ReadinessReason::AccountRejected {
                status: account.status.to_string(),
            });
        }

        if account.has_overdue_requirements {
            return Self::NotReady(ReadinessReason::OverdueRequirements);
        }

        if !account.is_card_present_eligible {
            return Self::NotReady(ReadinessReason::NotEligible);
        }

        if account.status == AccountStatus::Restricted {
            return Self::NotReady(ReadinessReason::AccountRestricted);
        }

        if account.has_pending_requirements {
            return Self::Pending(ReadinessReason::PendingRequirements {
                deadline: account.current_deadline,
            });
        }

        match account.status {
            AccountStatus::Complete | AccountStatus::RestrictedSoon => Self::Ready,
            ref other => Self::NotReady(ReadinessReason::UnsupportedStatus {
                status: other.to_string(),
            }),
        }
    }
}

impl Default for OnboardingReadiness {
    fn default() -> Self {
        Self::NotReady(ReadinessReason::Unknown)
    }
}

impl fmt::Display for OnboardingReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Pending(reason) => write!(f, "pending: {}", reason),
            Self::NotReady(reason) => write!(f, "not ready: {}", reason),
        }
    }
}
