use cardpay_core::{GatewayId, OrderId, PaymentIntentId, SiteId};
use tracing::{debug, info, warn};

use crate::error::{AccountLoadError, CaptureError, StorageResult};
use crate::models::PaymentGatewayAccount;
use crate::remote::{PaymentCaptureRequest, PaymentRemote};
use crate::repositories::PaymentGatewayAccountRepository;

/// Keeps the cached payment gateway account in sync with the processor and
/// captures terminal payments.
///
/// # Account loading
///
/// A successful load replaces the cached account for
/// `(site_id, "woocommerce-payments")`. A failed load, for whatever reason,
/// removes it: stale data is never left behind to make the site look ready
/// for card-present payments.
///
/// # Capture
///
/// The processor may answer a capture with HTTP 200 and an intent that did
/// not succeed. Only `succeeded` counts as a captured payment; captures are
/// never retried.
///
/// # Examples
///
/// ```no_run
/// use cardpay_core::SiteId;
/// use cardpay_payments::connection::{Database, DatabaseConfig};
/// use cardpay_payments::coordinator::PaymentGatewayAccountCoordinator;
/// use cardpay_payments::remote::{HttpPaymentRemote, RemoteConfig};
/// use cardpay_payments::repositories::SqlitePaymentGatewayAccountRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::open(DatabaseConfig::new("cardpay.db")).await?;
/// let remote = HttpPaymentRemote::new(RemoteConfig::new("https://shop.example/wp-json"))?;
/// let coordinator = PaymentGatewayAccountCoordinator::new(
///     remote,
///     SqlitePaymentGatewayAccountRepository::new(db.pool().clone()),
/// );
///
/// let site = SiteId::new(1)?;
/// coordinator.load_account(site).await?;
/// let account = coordinator.account(site).await?;
/// # Ok(())
/// # }
/// ```
pub struct PaymentGatewayAccountCoordinator<R, S> {
    remote: R,
    repository: S,
    gateway_id: GatewayId,
}

impl<R, S> PaymentGatewayAccountCoordinator<R, S>
where
    R: PaymentRemote,
    S: PaymentGatewayAccountRepository,
{
    pub fn new(remote: R, repository: S) -> Self {
        Self {
            remote,
            repository,
            gateway_id: GatewayId::wcpay(),
        }
    }

    /// Fetch the site's account and refresh the cache.
    ///
    /// # Errors
    ///
    /// - [`AccountLoadError::NotFound`] if the site has no account
    /// - [`AccountLoadError::TransportFailure`] if the remote call failed
    /// - [`AccountLoadError::Storage`] if the cache could not be written
    ///
    /// In every error case the cached account for the site is deleted.
    pub async fn load_account(&self, site_id: SiteId) -> Result<(), AccountLoadError> {
        let result = self.fetch_and_store(site_id).await;

        if let Err(error) = &result {
            warn!("Loading payment account for site {} failed: {}", site_id, error);
            self.discard_cached(site_id).await;
        }

        result
    }

    async fn fetch_and_store(&self, site_id: SiteId) -> Result<(), AccountLoadError> {
        let payload = self.remote.load_account(site_id).await?;
        let account = payload.into_account(site_id);

        self.repository.upsert(&account).await?;

        info!(
            "Stored payment account for site {} (status {}, card present {})",
            site_id, account.status, account.is_card_present_eligible
        );
        Ok(())
    }

    async fn discard_cached(&self, site_id: SiteId) {
        match self.repository.delete(site_id, &self.gateway_id).await {
            Ok(true) => debug!("Deleted cached payment account for site {}", site_id),
            Ok(false) => {}
            Err(e) => warn!("Failed to delete cached payment account for site {}: {}", site_id, e),
        }
    }

    /// Capture the payment of an order.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::TransportFailure`] if the remote call failed
    /// - [`CaptureError::PaymentCapture`] if the intent did not succeed
    pub async fn capture_payment(
        &self,
        site_id: SiteId,
        order_id: OrderId,
        payment_intent_id: &PaymentIntentId,
    ) -> Result<(), CaptureError> {
        let request = PaymentCaptureRequest::new(site_id, order_id, payment_intent_id.clone());
        let intent = self.remote.capture_payment(&request).await?;

        if !intent.status.is_succeeded() {
            debug!(
                "Unexpected payment intent status {} after capturing order {}",
                intent.status, order_id
            );
            return Err(CaptureError::PaymentCapture {
                status: intent.status.to_string(),
            });
        }

        info!("Captured payment {} for order {}", intent.id, order_id);
        Ok(())
    }

    /// The cached account of a site, if any.
    pub async fn account(&self, site_id: SiteId) -> StorageResult<Option<PaymentGatewayAccount>> {
        self.repository.find(site_id, &self.gateway_id).await
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn repository(&self) -> &S {
        &self.repository
    }
}
