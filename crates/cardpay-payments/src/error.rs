use thiserror::Error;

/// Errors of the local account cache.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a model
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors talking to the remote payment API.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request could not be sent or the response not received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an unexpected status code.
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The server has no such resource, e.g. the site has no account.
    #[error("Resource not found")]
    NotFound,

    /// The remote client is misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Specialized result type for remote calls
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Why loading a payment gateway account failed.
///
/// Any of these also removes the cached account.
#[derive(Debug, Error)]
pub enum AccountLoadError {
    /// The site has no payment gateway account.
    #[error("No payment gateway account for site")]
    NotFound,

    /// The remote call failed.
    #[error("Account load failed: {0}")]
    TransportFailure(RemoteError),

    /// The cache could not be updated.
    #[error("Account storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<RemoteError> for AccountLoadError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound => Self::NotFound,
            other => Self::TransportFailure(other),
        }
    }
}

/// Why capturing a payment failed.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The remote call failed.
    #[error("Payment capture request failed: {0}")]
    TransportFailure(#[from] RemoteError),

    /// The processor answered, but the intent did not succeed.
    #[error("Payment capture failed with intent status {status}")]
    PaymentCapture { status: String },
}
