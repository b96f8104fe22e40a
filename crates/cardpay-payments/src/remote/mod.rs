//! Remote payment processor API.
//!
//! [`PaymentRemote`] is the boundary the coordinator talks to;
//! [`HttpPaymentRemote`] implements it over HTTPS with `reqwest`.

#![allow(async_fn_in_trait)]

mod http;
mod payload;

pub use http::{HttpPaymentRemote, RemoteConfig};
pub use payload::{
    AccountPayload, IntentStatus, PaymentCaptureRequest, PaymentIntent, StoreCurrencies,
};

use cardpay_core::SiteId;

use crate::error::RemoteResult;

/// Remote payment processor operations.
pub trait PaymentRemote: Send + Sync {
    /// Load the WCPay account of a site.
    ///
    /// Returns [`RemoteError::NotFound`](crate::error::RemoteError::NotFound)
    /// when the site has no account.
    async fn load_account(&self, site_id: SiteId) -> RemoteResult<AccountPayload>;

    /// Capture a terminal payment and return the resulting intent.
    async fn capture_payment(&self, request: &PaymentCaptureRequest) -> RemoteResult<PaymentIntent>;
}
