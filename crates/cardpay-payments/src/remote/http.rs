use std::time::Duration;

use cardpay_core::SiteId;
use cardpay_core::constants::{DEFAULT_REMOTE_CONNECT_TIMEOUT_MS, DEFAULT_REMOTE_TIMEOUT_MS};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use super::PaymentRemote;
use super::payload::{AccountPayload, PaymentCaptureRequest, PaymentIntent};
use crate::error::{RemoteError, RemoteResult};

/// Configuration of the HTTP payment client
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the API, e.g. `https://example.com/wp-json/wc/v3`
    pub base_url: String,

    /// Total timeout of a request
    pub timeout: Duration,

    /// Timeout for establishing the connection
    pub connect_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_REMOTE_CONNECT_TIMEOUT_MS),
        }
    }
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// [`PaymentRemote`] over HTTP.
///
/// # Example
///
/// ```no_run
/// use cardpay_core::SiteId;
/// use cardpay_payments::remote::{HttpPaymentRemote, PaymentRemote, RemoteConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let remote = HttpPaymentRemote::new(RemoteConfig::new("https://shop.example/wp-json"))?;
/// let account = remote.load_account(SiteId::new(1)?).await?;
/// println!("{}", account.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpPaymentRemote {
    client: Client,
    base_url: String,
}

impl HttpPaymentRemote {
    pub fn new(config: RemoteConfig) -> RemoteResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(RemoteError::Configuration("base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(RemoteError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn account_url(&self, site_id: SiteId) -> String {
        format!("{}/sites/{}/payments/accounts", self.base_url, site_id)
    }

    fn capture_url(&self, request: &PaymentCaptureRequest) -> String {
        format!(
            "{}/sites/{}/payments/orders/{}/capture_terminal_payment",
            self.base_url, request.site_id, request.order_id
        )
    }

    /// Read the body of a response, mapping error statuses.
    async fn body(response: Response) -> RemoteResult<Vec<u8>> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Payment API answered {}: {}", status, body);
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

impl PaymentRemote for HttpPaymentRemote {
    async fn load_account(&self, site_id: SiteId) -> RemoteResult<AccountPayload> {
        let url = self.account_url(site_id);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let body = Self::body(response).await?;

        AccountPayload::decode(&body)
    }

    async fn capture_payment(&self, request: &PaymentCaptureRequest) -> RemoteResult<PaymentIntent> {
        let url = self.capture_url(request);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(&request.body()).send().await?;
        let body = Self::body(response).await?;

        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}
