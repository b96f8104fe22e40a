//! Error types for card reader operations.
//!
//! Discovery and connection failures are separate closed enums because the
//! flow reacts to them differently. Both carry a distinct Bluetooth
//! permission case: resolving it means sending the merchant to the system
//! settings, not retrying.

use serde::{Deserialize, Serialize};

/// Errors reported while scanning for readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "cause", rename_all = "snake_case")]
pub enum DiscoveryError {
    /// The app is not allowed to use the Bluetooth radio.
    #[error("Bluetooth permission denied")]
    BluetoothDenied,

    /// The SDK could not start or continue the scan.
    #[error("Scan failed: {0}")]
    ScanFailed(String),
}

impl DiscoveryError {
    /// Create a new scan failure.
    pub fn scan_failed(cause: impl Into<String>) -> Self {
        Self::ScanFailed(cause.into())
    }
}

/// Errors reported while connecting to a selected reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionError {
    /// The reader went out of range, was switched off, or rejected the link.
    #[error("Reader unreachable")]
    ReaderUnreachable,

    /// The app is not allowed to use the Bluetooth radio.
    #[error("Bluetooth permission denied")]
    BluetoothDenied,

    /// The reader did not complete the connection in time.
    #[error("Connection timed out")]
    Timeout,
}

/// Any failure that ends a reader session.
///
/// This is the cause carried by the `Failed` state of the connection state
/// machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "phase", content = "error", rename_all = "snake_case")]
pub enum ReaderError {
    /// Failure while scanning.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Failure while connecting.
    #[error("Connection failed: {0}")]
    Connection(#[from] ConnectionError),
}

impl ReaderError {
    /// Whether the failure can only be resolved in the system settings.
    pub fn requires_settings(&self) -> bool {
        matches!(
            self,
            Self::Discovery(DiscoveryError::BluetoothDenied)
                | Self::Connection(ConnectionError::BluetoothDenied)
        )
    }
}

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for connection operations.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;
