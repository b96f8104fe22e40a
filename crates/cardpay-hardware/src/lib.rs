//! Card reader abstraction layer for in-person payments.
//!
//! This crate defines the boundary between the payment flow and the card
//! reader vendor SDK: scanning for Bluetooth/USB readers, connecting to one
//! of them, and cancelling a scan. The SDK itself is an external
//! collaborator; a mock implementation is provided for development and
//! testing.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All SDK operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Single sequence**: SDK callbacks are marshaled through a
//!   [`DiscoveryEventSink`] into one [`DiscoveryStream`], so consumers never
//!   see concurrent events.
//! - **Cancellable**: every scan owns a cancellation token; cancelling is
//!   idempotent and releases the radio.
//! - **Closed errors**: [`DiscoveryError`] and [`ConnectionError`] are
//!   closed enums, with Bluetooth permission denial as its own case.
//!
//! # Example
//!
//! ```no_run
//! use cardpay_hardware::traits::{DiscoveryEvent, ReaderDiscoveryChannel};
//! use cardpay_hardware::DiscoveryError;
//!
//! async fn scan<C: ReaderDiscoveryChannel>(channel: &mut C) -> Result<usize, DiscoveryError> {
//!     let mut events = channel.start_discovery().await?;
//!     let mut found = 0;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             DiscoveryEvent::ReaderFound(reader) => {
//!                 found += 1;
//!                 println!("Found {}", reader.display_name());
//!             }
//!             DiscoveryEvent::Failed(error) => return Err(error),
//!             _ => {}
//!         }
//!     }
//!
//!     Ok(found)
//! }
//! ```

pub mod devices;
pub mod discovery;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyCardReader;
pub use discovery::{DiscoveryEventSink, DiscoveryStream, discovery_channel};
pub use error::{ConnectionError, ConnectionResult, DiscoveryError, DiscoveryResult, ReaderError};
pub use traits::{DiscoveryEvent, ReaderDiscoveryChannel};
pub use types::{Reader, ReaderConnectionType};
