//! Mock card reader SDK for testing and development.
//!
//! This module provides a simulated vendor SDK that can be controlled
//! programmatically, without Bluetooth hardware.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cardpay_core::ReaderId;
use cardpay_core::constants::DEFAULT_DISCOVERY_BUFFER;
use tokio::sync::Mutex;

use crate::discovery::{DiscoveryEventSink, DiscoveryStream, discovery_channel};
use crate::error::{ConnectionError, ConnectionResult, DiscoveryError, DiscoveryResult};
use crate::traits::{DiscoveryEvent, ReaderDiscoveryChannel};
use crate::types::Reader;

/// Mock card reader SDK.
///
/// Readers are announced through the paired [`MockCardReaderHandle`]; the
/// SDK side behaves like a real scan: events flow through a
/// [`DiscoveryStream`], connects succeed only for announced readers, and
/// cancellation releases the simulated radio.
///
/// # Examples
///
/// ```
/// use cardpay_core::ReaderId;
/// use cardpay_hardware::mock::MockCardReader;
/// use cardpay_hardware::traits::{DiscoveryEvent, ReaderDiscoveryChannel};
/// use cardpay_hardware::types::Reader;
///
/// #[tokio::main]
/// async fn main() {
///     let (mut sdk, handle) = MockCardReader::new();
///
///     let mut events = sdk.start_discovery().await.unwrap();
///
///     let reader = Reader::new(ReaderId::new("CHB1").unwrap(), "Chipper 2X");
///     handle.announce_reader(reader.clone()).await;
///
///     assert_eq!(events.recv().await, Some(DiscoveryEvent::ReaderFound(reader.clone())));
///
///     let connected = sdk.connect(&reader.id).await.unwrap();
///     assert_eq!(connected.name, "Chipper 2X");
/// }
/// ```
#[derive(Debug)]
pub struct MockCardReader {
    state: Arc<Mutex<MockState>>,

    /// Device name
    name: String,

    /// Discovery channel capacity
    buffer: usize,
}

/// State shared between the SDK side and its handle.
#[derive(Debug, Default)]
struct MockState {
    bluetooth_denied: bool,
    start_failure: Option<DiscoveryError>,
    active_scan: Option<DiscoveryEventSink>,
    announced: Vec<Reader>,
    connect_failures: HashMap<ReaderId, ConnectionError>,
    connect_delay: Option<Duration>,
    connected: Option<ReaderId>,
    discovery_starts: usize,
    radio_releases: usize,
}

impl MockState {
    /// Release the radio held by the active scan, if any.
    fn release_radio(&mut self) -> bool {
        match self.active_scan.take() {
            Some(sink) => {
                sink.token().cancel();
                self.radio_releases += 1;
                true
            }
            None => false,
        }
    }
}

impl MockCardReader {
    /// Create a new mock SDK with the default name.
    ///
    /// Returns a tuple of (MockCardReader, MockCardReaderHandle) where the
    /// handle is used to simulate reader announcements and failures.
    pub fn new() -> (Self, MockCardReaderHandle) {
        Self::with_name("Mock Card Reader SDK".to_string())
    }

    /// Create a new mock SDK with a custom name.
    pub fn with_name(name: String) -> (Self, MockCardReaderHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));

        let sdk = Self {
            state: Arc::clone(&state),
            name: name.clone(),
            buffer: DEFAULT_DISCOVERY_BUFFER,
        };

        let handle = MockCardReaderHandle { state, name };

        (sdk, handle)
    }

    /// Get the SDK name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for MockCardReader {
    fn default() -> Self {
        Self::new().0
    }
}

impl ReaderDiscoveryChannel for MockCardReader {
    async fn start_discovery(&mut self) -> DiscoveryResult<DiscoveryStream> {
        let mut state = self.state.lock().await;

        if state.bluetooth_denied {
            return Err(DiscoveryError::BluetoothDenied);
        }
        if let Some(error) = state.start_failure.clone() {
            return Err(error);
        }

        // Restarting a scan ends the previous one
        state.release_radio();

        let (sink, stream) = discovery_channel(self.buffer);
        state.active_scan = Some(sink);
        state.announced.clear();
        state.discovery_starts += 1;

        Ok(stream)
    }

    async fn connect(&mut self, reader_id: &ReaderId) -> ConnectionResult<Reader> {
        let delay = {
            let state = self.state.lock().await;
            if state.bluetooth_denied {
                return Err(ConnectionError::BluetoothDenied);
            }
            state.connect_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;

        if let Some(error) = state.connect_failures.get(reader_id) {
            return Err(error.clone());
        }

        let reader = state
            .announced
            .iter()
            .find(|reader| &reader.id == reader_id)
            .cloned()
            .ok_or(ConnectionError::ReaderUnreachable)?;

        state.connected = Some(reader.id.clone());
        Ok(reader)
    }

    async fn cancel_discovery(&mut self) {
        self.state.lock().await.release_radio();
    }

    async fn is_discovering(&self) -> bool {
        self.state
            .lock()
            .await
            .active_scan
            .as_ref()
            .is_some_and(|sink| !sink.is_closed())
    }
}

/// Handle for controlling a mock card reader SDK.
///
/// Cloned handles share state with the SDK and with each other.
#[derive(Debug, Clone)]
pub struct MockCardReaderHandle {
    state: Arc<Mutex<MockState>>,

    /// Device name
    name: String,
}

impl MockCardReaderHandle {
    /// Announce a reader on the running scan.
    ///
    /// Returns `false` when no scan is running or it was cancelled; the
    /// reader is then not announced.
    pub async fn announce_reader(&self, reader: Reader) -> bool {
        let sink = {
            let mut state = self.state.lock().await;
            let Some(sink) = state.active_scan.clone() else {
                return false;
            };
            if sink.is_closed() {
                return false;
            }
            if !state.announced.iter().any(|known| known.id == reader.id) {
                state.announced.push(reader.clone());
            }
            sink
        };

        sink.emit(DiscoveryEvent::ReaderFound(reader)).await
    }

    /// Fail the running scan with the given error.
    ///
    /// The error is delivered as the final event; the scan then stops.
    pub async fn fail_discovery(&self, error: DiscoveryError) -> bool {
        let sink = self.state.lock().await.active_scan.take();

        match sink {
            Some(sink) => sink.emit(DiscoveryEvent::Failed(error)).await,
            None => false,
        }
    }

    /// Make later scans fail to start with the given error.
    pub async fn fail_next_start(&self, error: DiscoveryError) {
        self.state.lock().await.start_failure = Some(error);
    }

    /// Simulate the merchant denying (or granting) Bluetooth access.
    pub async fn set_bluetooth_denied(&self, denied: bool) {
        self.state.lock().await.bluetooth_denied = denied;
    }

    /// Make connects to the given reader fail with `error`.
    pub async fn fail_connect(&self, reader_id: ReaderId, error: ConnectionError) {
        self.state
            .lock()
            .await
            .connect_failures
            .insert(reader_id, error);
    }

    /// Delay every connect by `delay`.
    pub async fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().await.connect_delay = Some(delay);
    }

    /// Whether a scan currently holds the simulated radio.
    pub async fn is_discovering(&self) -> bool {
        self.state
            .lock()
            .await
            .active_scan
            .as_ref()
            .is_some_and(|sink| !sink.is_closed())
    }

    /// Number of scans started so far.
    pub async fn discovery_starts(&self) -> usize {
        self.state.lock().await.discovery_starts
    }

    /// Number of times a held radio was released by cancellation or restart.
    pub async fn radio_releases(&self) -> usize {
        self.state.lock().await.radio_releases
    }

    /// The reader of the last successful connect, if any.
    pub async fn connected_reader(&self) -> Option<ReaderId> {
        self.state.lock().await.connected.clone()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
