//! Card reader SDK trait definitions.
//!
//! The vendor SDK is an external collaborator. This module defines the
//! contract the payment flow needs from it: start a scan that produces a
//! stream of events, connect to one of the announced readers, and cancel
//! the scan.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use cardpay_core::ReaderId;

use crate::discovery::DiscoveryStream;
use crate::error::{ConnectionResult, DiscoveryError, DiscoveryResult};
use crate::types::Reader;

/// Event produced while a scan is running.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DiscoveryEvent {
    /// A reader was announced. The same reader may be announced more than once.
    ReaderFound(Reader),

    /// The scan failed. No further events follow.
    Failed(DiscoveryError),
}

impl DiscoveryEvent {
    /// Whether this event ends the scan.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Card reader discovery and connection abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper from the
/// [`devices`](crate::devices) module when the concrete SDK is chosen at
/// runtime.
///
/// # Radio Access
///
/// Starting a scan activates the Bluetooth radio. Callers are expected to
/// request the permission first; a denial surfaces as
/// [`DiscoveryError::BluetoothDenied`] or
/// [`ConnectionError::BluetoothDenied`](crate::ConnectionError::BluetoothDenied).
///
/// # Examples
///
/// ```no_run
/// use cardpay_hardware::traits::{DiscoveryEvent, ReaderDiscoveryChannel};
///
/// async fn first_reader<C: ReaderDiscoveryChannel>(channel: &mut C) -> Option<String> {
///     let mut events = channel.start_discovery().await.ok()?;
///
///     let found = match events.recv().await? {
///         DiscoveryEvent::ReaderFound(reader) => Some(reader.name),
///         _ => None,
///     };
///
///     channel.cancel_discovery().await;
///     found
/// }
/// ```
pub trait ReaderDiscoveryChannel: Send + Sync {
    /// Start scanning for readers.
    ///
    /// Returns a stream that yields zero or more `ReaderFound` events until
    /// a `Failed` event or until the scan is cancelled. Starting a new scan
    /// while one is running restarts it: the previous stream ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio cannot be activated at all, e.g. the
    /// Bluetooth permission was denied.
    async fn start_discovery(&mut self) -> DiscoveryResult<DiscoveryStream>;

    /// Connect to a previously announced reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reader is out of range or unknown to the SDK
    /// - The Bluetooth permission was denied
    /// - The reader does not answer in time
    async fn connect(&mut self, reader_id: &ReaderId) -> ConnectionResult<Reader>;

    /// Stop scanning and release the radio.
    ///
    /// Idempotent: cancelling when no scan runs does nothing.
    async fn cancel_discovery(&mut self);

    /// Whether a scan currently holds the radio.
    async fn is_discovering(&self) -> bool;
}
