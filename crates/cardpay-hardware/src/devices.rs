//! Enum wrappers for card reader SDK dispatch.
//!
//! Native `async fn` in traits (RPITIT - Rust Edition 2024) are not
//! object-safe, so `Box<dyn ReaderDiscoveryChannel>` is not available.
//! The enum below provides concrete type dispatch instead, which keeps the
//! zero-cost abstraction and lets feature flags add vendor SDKs.
//!
//! # Examples
//!
//! ```
//! use cardpay_hardware::devices::AnyCardReader;
//! use cardpay_hardware::mock::MockCardReader;
//!
//! let (sdk, _handle) = MockCardReader::new();
//! let any_reader = AnyCardReader::Mock(sdk);
//!
//! // Can now be used polymorphically through the ReaderDiscoveryChannel trait
//! ```

use cardpay_core::ReaderId;

use crate::discovery::DiscoveryStream;
use crate::error::{ConnectionResult, DiscoveryResult};
use crate::mock::MockCardReader;
use crate::traits::ReaderDiscoveryChannel;
use crate::types::Reader;

/// Enum wrapper for card reader SDK dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCardReader {
    /// Mock SDK for development and testing.
    Mock(MockCardReader),
}

impl ReaderDiscoveryChannel for AnyCardReader {
    async fn start_discovery(&mut self) -> DiscoveryResult<DiscoveryStream> {
        match self {
            Self::Mock(sdk) => sdk.start_discovery().await,
        }
    }

    async fn connect(&mut self, reader_id: &ReaderId) -> ConnectionResult<Reader> {
        match self {
            Self::Mock(sdk) => sdk.connect(reader_id).await,
        }
    }

    async fn cancel_discovery(&mut self) {
        match self {
            Self::Mock(sdk) => sdk.cancel_discovery().await,
        }
    }

    async fn is_discovering(&self) -> bool {
        match self {
            Self::Mock(sdk) => sdk.is_discovering().await,
        }
    }
}

impl From<MockCardReader> for AnyCardReader {
    fn from(sdk: MockCardReader) -> Self {
        Self::Mock(sdk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DiscoveryEvent;

    #[tokio::test]
    async fn test_any_card_reader_dispatch() {
        let (sdk, handle) = MockCardReader::new();
        let mut any_reader = AnyCardReader::from(sdk);

        let mut events = any_reader.start_discovery().await.unwrap();
        assert!(any_reader.is_discovering().await);

        let reader = Reader::new(ReaderId::new("A").unwrap(), "Reader A");
        handle.announce_reader(reader.clone()).await;
        assert_eq!(
            events.recv().await,
            Some(DiscoveryEvent::ReaderFound(reader.clone()))
        );

        let connected = any_reader.connect(&reader.id).await.unwrap();
        assert_eq!(connected.id, reader.id);

        any_reader.cancel_discovery().await;
        assert!(!any_reader.is_discovering().await);
    }
}
