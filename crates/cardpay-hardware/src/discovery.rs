//! Discovery event plumbing.
//!
//! Vendor SDKs report readers through callbacks on threads they own. The
//! payment flow, on the other hand, must see every event on a single
//! logical sequence so that the connection session is never mutated
//! concurrently. This module provides the bridge:
//!
//! ```text
//! ┌────────────┐  emit / try_emit  ┌──────────────────┐  recv   ┌─────────────┐
//! │ SDK        │──────────────────►│  Event Channel   │────────►│ Connection  │
//! │ callbacks  │                   │  (mpsc, bounded) │         │ flow task   │
//! └────────────┘                   └──────────────────┘         └─────────────┘
//!        ▲                                   ▲
//!        └────────── CancellationToken ──────┘
//! ```
//!
//! Sink and stream share a [`CancellationToken`]. Once the scan is
//! cancelled the stream ends immediately and every later emit is dropped,
//! so no callback can reach a session that has been torn down.
//!
//! # Examples
//!
//! ```
//! use cardpay_core::ReaderId;
//! use cardpay_hardware::discovery::discovery_channel;
//! use cardpay_hardware::traits::DiscoveryEvent;
//! use cardpay_hardware::types::Reader;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sink, mut stream) = discovery_channel(8);
//!
//!     let reader = Reader::new(ReaderId::new("CHB1").unwrap(), "Chipper");
//!     assert!(sink.emit(DiscoveryEvent::ReaderFound(reader)).await);
//!
//!     assert!(matches!(stream.recv().await, Some(DiscoveryEvent::ReaderFound(_))));
//!
//!     stream.cancel();
//!     assert!(stream.recv().await.is_none());
//!     assert!(!sink.emit(DiscoveryEvent::Failed(
//!         cardpay_hardware::DiscoveryError::scan_failed("late")
//!     )).await);
//! }
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::traits::DiscoveryEvent;

/// Create a connected sink/stream pair with a fresh cancellation token.
pub fn discovery_channel(capacity: usize) -> (DiscoveryEventSink, DiscoveryStream) {
    discovery_channel_with_token(capacity, CancellationToken::new())
}

/// Create a connected sink/stream pair bound to an existing token.
///
/// Useful when the scan must also end when a parent operation is cancelled:
/// pass a child token of the parent.
pub fn discovery_channel_with_token(
    capacity: usize,
    token: CancellationToken,
) -> (DiscoveryEventSink, DiscoveryStream) {
    let (event_tx, event_rx) = mpsc::channel(capacity.max(1));

    let sink = DiscoveryEventSink {
        event_tx,
        token: token.clone(),
    };

    let stream = DiscoveryStream { event_rx, token };

    (sink, stream)
}

/// Producer side of a scan, handed to SDK callbacks.
#[derive(Debug, Clone)]
pub struct DiscoveryEventSink {
    event_tx: mpsc::Sender<DiscoveryEvent>,
    token: CancellationToken,
}

impl DiscoveryEventSink {
    /// Deliver an event, waiting for channel capacity.
    ///
    /// Returns `false` if the scan was cancelled or the stream was dropped;
    /// the event is discarded in that case.
    pub async fn emit(&self, event: DiscoveryEvent) -> bool {
        if self.token.is_cancelled() {
            trace!("Dropping discovery event after cancellation");
            return false;
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            result = self.event_tx.send(event) => result.is_ok(),
        }
    }

    /// Deliver an event without waiting.
    ///
    /// Intended for synchronous SDK callback threads. Events are dropped
    /// when the scan was cancelled or when the channel is full.
    pub fn try_emit(&self, event: DiscoveryEvent) -> bool {
        if self.token.is_cancelled() {
            trace!("Dropping discovery event after cancellation");
            return false;
        }

        match self.event_tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("Discovery channel full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Whether events can no longer be delivered.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.event_tx.is_closed()
    }

    /// The token that ends this scan.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Consumer side of a scan.
///
/// The stream ends (`recv` returns `None`) when the scan is cancelled or
/// when every sink has been dropped.
#[derive(Debug)]
pub struct DiscoveryStream {
    event_rx: mpsc::Receiver<DiscoveryEvent>,
    token: CancellationToken,
}

impl DiscoveryStream {
    /// Receive the next event.
    ///
    /// Cancellation wins over buffered events: after `cancel()` no event is
    /// returned, even if some were already queued.
    pub async fn recv(&mut self) -> Option<DiscoveryEvent> {
        if self.token.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            event = self.event_rx.recv() => event,
        }
    }

    /// End the scan. Idempotent.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            debug!("Cancelling discovery stream");
            self.token.cancel();
        }
    }

    /// Whether the scan was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The token that ends this scan.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for DiscoveryStream {
    fn drop(&mut self) {
        // A dropped consumer means nobody listens anymore; stop the producers.
        self.token.cancel();
    }
}
