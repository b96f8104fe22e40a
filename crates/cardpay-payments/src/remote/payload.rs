//! Wire payloads of the remote payment API.

use std::fmt;

use cardpay_core::{GatewayId, OrderId, PaymentIntentId, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, RemoteResult};
use crate::models::{AccountStatus, PaymentGatewayAccount};

/// Currencies configured for the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCurrencies {
    #[serde(default)]
    pub default: String,
    #[serde(default)]
    pub supported: Vec<String>,
}

/// Account payload of `GET /sites/{site_id}/payments/accounts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPayload {
    pub status: AccountStatus,
    #[serde(default)]
    pub has_pending_requirements: bool,
    #[serde(default)]
    pub has_overdue_requirements: bool,

    /// Unix timestamp in seconds.
    #[serde(default)]
    pub current_deadline: Option<i64>,

    #[serde(default)]
    pub statement_descriptor: String,
    #[serde(default)]
    pub store_currencies: StoreCurrencies,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub card_present_eligible: bool,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub test_mode: bool,
}

impl AccountPayload {
    /// Decode an account response body.
    ///
    /// The API answers with an empty array when the site has no account.
    pub fn decode(body: &[u8]) -> RemoteResult<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

        match &value {
            serde_json::Value::Array(items) if items.is_empty() => Err(RemoteError::NotFound),
            serde_json::Value::Null => Err(RemoteError::NotFound),
            _ => serde_json::from_value(value).map_err(|e| RemoteError::Decode(e.to_string())),
        }
    }

    /// Convert into the account of `site_id` for the WCPay gateway.
    pub fn into_account(self, site_id: SiteId) -> PaymentGatewayAccount {
        PaymentGatewayAccount {
            site_id,
            gateway_id: GatewayId::wcpay(),
            status: self.status,
            has_pending_requirements: self.has_pending_requirements,
            has_overdue_requirements: self.has_overdue_requirements,
            current_deadline: self
                .current_deadline
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            statement_descriptor: self.statement_descriptor,
            default_currency: self.store_currencies.default,
            supported_currencies: self.store_currencies.supported,
            country: self.country,
            is_card_present_eligible: self.card_present_eligible,
            is_live: self.is_live,
            is_in_test_mode: self.test_mode,
        }
    }
}

/// Status of a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Unknown(String),
}

impl IntentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => cardpay_core::constants::INTENT_STATUS_SUCCEEDED,
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl From<String> for IntentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "processing" => Self::Processing,
            "requires_capture" => Self::RequiresCapture,
            "canceled" => Self::Canceled,
            "succeeded" => Self::Succeeded,
            _ => Self::Unknown(value),
        }
    }
}

impl From<IntentStatus> for String {
    fn from(status: IntentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment intent returned by a capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: IntentStatus,
}

/// A request to capture a terminal payment for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCaptureRequest {
    pub site_id: SiteId,
    pub order_id: OrderId,
    pub payment_intent_id: PaymentIntentId,
}

impl PaymentCaptureRequest {
    pub fn new(site_id: SiteId, order_id: OrderId, payment_intent_id: PaymentIntentId) -> Self {
        Self {
            site_id,
            order_id,
            payment_intent_id,
        }
    }

    /// JSON body of the capture POST.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "payment_intent_id": self.payment_intent_id.as_str() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ACCOUNT_JSON: &str = r#"{
        "status": "complete",
        "has_pending_requirements": false,
        "has_overdue_requirements": false,
        "current_deadline": 1767225600,
        "statement_descriptor": "MY STORE",
        "store_currencies": { "default": "usd", "supported": ["usd", "cad"] },
        "country": "US",
        "card_present_eligible": true,
        "is_live": true,
        "test_mode": false
    }"#;

    #[test]
    fn test_decode_account() {
        let payload = AccountPayload::decode(ACCOUNT_JSON.as_bytes()).unwrap();
        let account = payload.into_account(SiteId::new(12).unwrap());

        assert_eq!(account.status, AccountStatus::Complete);
        assert_eq!(account.gateway_id, GatewayId::wcpay());
        assert_eq!(account.default_currency, "usd");
        assert_eq!(account.supported_currencies, vec!["usd", "cad"]);
        assert!(account.is_card_present_eligible);
        assert_eq!(
            account.current_deadline.map(|d| d.timestamp()),
            Some(1_767_225_600)
        );
    }

    #[test]
    fn test_decode_minimal_account() {
        let payload = AccountPayload::decode(br#"{"status":"restricted_soon"}"#).unwrap();
        assert_eq!(payload.status, AccountStatus::RestrictedSoon);
        assert!(payload.current_deadline.is_none());
        assert!(!payload.card_present_eligible);
    }

    #[rstest]
    #[case(b"[]".as_slice())]
    #[case(b"null".as_slice())]
    fn test_empty_payload_is_not_found(#[case] body: &[u8]) {
        assert!(matches!(
            AccountPayload::decode(body),
            Err(RemoteError::NotFound)
        ));
    }

    #[rstest]
    #[case(b"not json".as_slice())]
    #[case(br#"{"country":"US"}"#.as_slice())]
    fn test_bad_payload_is_decode_error(#[case] body: &[u8]) {
        assert!(matches!(
            AccountPayload::decode(body),
            Err(RemoteError::Decode(_))
        ));
    }

    #[rstest]
    #[case("succeeded", true)]
    #[case("requires_capture", false)]
    #[case("canceled", false)]
    #[case("something_new", false)]
    fn test_intent_status(#[case] raw: &str, #[case] succeeded: bool) {
        let intent: PaymentIntent =
            serde_json::from_str(&format!(r#"{{"id":"pi_1","status":"{}"}}"#, raw)).unwrap();
        assert_eq!(intent.status.is_succeeded(), succeeded);
        assert_eq!(intent.status.as_str(), raw);
    }

    #[test]
    fn test_capture_body() {
        let request = PaymentCaptureRequest::new(
            SiteId::new(1).unwrap(),
            OrderId::new(99).unwrap(),
            PaymentIntentId::new("pi_123").unwrap(),
        );
        assert_eq!(
            request.body(),
            serde_json::json!({ "payment_intent_id": "pi_123" })
        );
    }
}
