use std::fmt;

use cardpay_core::{GatewayId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Status of a payment gateway account as reported by the processor.
///
/// Unknown values are kept verbatim so they can be logged and persisted
/// without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountStatus {
    Complete,
    Restricted,
    RestrictedSoon,
    RejectedFraud,
    RejectedTermsOfService,
    RejectedListed,
    RejectedOther,
    NoAccount,
    Unknown(String),
}

impl AccountStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Complete => "complete",
            Self::Restricted => "restricted",
            Self::RestrictedSoon => "restricted_soon",
            Self::RejectedFraud => "rejected.fraud",
            Self::RejectedTermsOfService => "rejected.terms_of_service",
            Self::RejectedListed => "rejected.listed",
            Self::RejectedOther => "rejected.other",
            Self::NoAccount => "no_account",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether the processor rejected the account for good.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            Self::RejectedFraud
                | Self::RejectedTermsOfService
                | Self::RejectedListed
                | Self::RejectedOther
        )
    }
}

impl From<&str> for AccountStatus {
    fn from(value: &str) -> Self {
        match value {
            "complete" => Self::Complete,
            "restricted" => Self::Restricted,
            "restricted_soon" => Self::RestrictedSoon,
            "rejected.fraud" => Self::RejectedFraud,
            "rejected.terms_of_service" => Self::RejectedTermsOfService,
            "rejected.listed" => Self::RejectedListed,
            "rejected.other" => Self::RejectedOther,
            "no_account" | "NOACCOUNT" => Self::NoAccount,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for AccountStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AccountStatus> for String {
    fn from(status: AccountStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The merchant's account with the payment gateway, cached per site.
///
/// There is exactly one account per `(site_id, gateway_id)`.
///
/// # Examples
///
/// ```
/// use cardpay_core::{GatewayId, SiteId};
/// use cardpay_payments::models::{AccountStatus, PaymentGatewayAccount};
///
/// let account = PaymentGatewayAccount::new(SiteId::new(42).unwrap(), GatewayId::wcpay())
///     .with_status(AccountStatus::Complete);
///
/// assert_eq!(account.gateway_id.as_str(), "woocommerce-payments");
/// assert!(!account.is_card_present_eligible);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentGatewayAccount {
    pub site_id: SiteId,
    pub gateway_id: GatewayId,
    pub status: AccountStatus,
    pub has_pending_requirements: bool,
    pub has_overdue_requirements: bool,

    /// Deadline for pending requirements, if any.
    pub current_deadline: Option<DateTime<Utc>>,

    pub statement_descriptor: String,
    pub default_currency: String,
    pub supported_currencies: Vec<String>,
    pub country: String,
    pub is_card_present_eligible: bool,
    pub is_live: bool,
    pub is_in_test_mode: bool,
}

impl PaymentGatewayAccount {
    /// Create an account with no requirements and no capabilities.
    pub fn new(site_id: SiteId, gateway_id: GatewayId) -> Self {
        Self {
            site_id,
            gateway_id,
            status: AccountStatus::NoAccount,
            has_pending_requirements: false,
            has_overdue_requirements: false,
            current_deadline: None,
            statement_descriptor: String::new(),
            default_currency: String::new(),
            supported_currencies: Vec::new(),
            country: String::new(),
            is_card_present_eligible: false,
            is_live: false,
            is_in_test_mode: false,
        }
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_card_present_eligible(mut self, eligible: bool) -> Self {
        self.is_card_present_eligible = eligible;
        self
    }

    pub fn with_requirements(mut self, pending: bool, overdue: bool) -> Self {
        self.has_pending_requirements = pending;
        self.has_overdue_requirements = overdue;
        self
    }
}

/// Row of the `payment_gateway_accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AccountRow {
    pub site_id: i64,
    pub gateway_id: String,
    pub status: String,
    pub has_pending_requirements: bool,
    pub has_overdue_requirements: bool,
    pub current_deadline: Option<DateTime<Utc>>,
    pub statement_descriptor: String,
    pub default_currency: String,
    pub supported_currencies: String,
    pub country: String,
    pub is_card_present_eligible: bool,
    pub is_live: bool,
    pub is_in_test_mode: bool,
}

impl TryFrom<AccountRow> for PaymentGatewayAccount {
    type Error = StorageError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn fmt::Display| StorageError::Corrupt(e.to_string());

        Ok(Self {
            site_id: SiteId::new(row.site_id).map_err(|e| corrupt(&e))?,
            gateway_id: GatewayId::new(&row.gateway_id).map_err(|e| corrupt(&e))?,
            status: AccountStatus::from(row.status),
            has_pending_requirements: row.has_pending_requirements,
            has_overdue_requirements: row.has_overdue_requirements,
            current_deadline: row.current_deadline,
            statement_descriptor: row.statement_descriptor,
            default_currency: row.default_currency,
            supported_currencies: serde_json::from_str(&row.supported_currencies)
                .map_err(|e| corrupt(&e))?,
            country: row.country,
            is_card_present_eligible: row.is_card_present_eligible,
            is_live: row.is_live,
            is_in_test_mode: row.is_in_test_mode,
        })
    }
}
