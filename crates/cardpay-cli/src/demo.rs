//! Simulated reader session over the mock SDK.

use std::time::Duration;

use anyhow::{Context, Result};
use cardpay_connection::{ConnectionFlow, ConnectionState, FlowCommand, FlowConfig};
use cardpay_core::ReaderId;
use cardpay_hardware::mock::{MockCardReader, MockCardReaderHandle};
use cardpay_hardware::{AnyCardReader, ConnectionError, DiscoveryError, Reader};
use clap::ValueEnum;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::presenter::TracingPresenter;

/// Failure to inject into the simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Failure {
    /// Bluetooth permission is denied before scanning.
    Bluetooth,
    /// The scan fails after starting.
    Scan,
    /// The selected reader cannot be reached.
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub readers: usize,
    pub failure: Option<Failure>,
    pub connect_timeout: Duration,
}

fn demo_reader(index: usize) -> Result<Reader> {
    let id = ReaderId::new(&format!("CHB20{:04}", index + 1))?;
    let step = i16::try_from(index).unwrap_or(i16::MAX);
    Ok(Reader::new(id, format!("Chipper 2X #{}", index + 1))
        .with_battery_level(1.0 - index as f32 * 0.15)
        .with_signal_strength((-50i16).saturating_sub(step.saturating_mul(5))))
}

async fn wait_for_scan(handle: &MockCardReaderHandle) {
    while !handle.is_discovering().await {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Plays the SDK and the merchant: announces readers, then asks for the
/// results and picks the first one.
async fn script(
    handle: MockCardReaderHandle,
    readers: Vec<Reader>,
    failure: Option<Failure>,
    commands: mpsc::Sender<FlowCommand>,
) {
    wait_for_scan(&handle).await;

    if failure == Some(Failure::Scan) {
        handle
            .fail_discovery(DiscoveryError::scan_failed("radio stopped responding"))
            .await;
        return;
    }

    for reader in &readers {
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.announce_reader(reader.clone()).await;
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    if commands.send(FlowCommand::ShowResults).await.is_err() {
        return;
    }

    let command = match readers.first() {
        Some(reader) => {
            if failure == Some(Failure::Unreachable) {
                handle
                    .fail_connect(reader.id.clone(), ConnectionError::ReaderUnreachable)
                    .await;
            }
            FlowCommand::SelectReader(reader.id.clone())
        }
        None => FlowCommand::Cancel,
    };

    tokio::time::sleep(Duration::from_millis(200)).await;
    let _ = commands.send(command).await;
}

/// Run one connection attempt against the mock SDK.
pub async fn run(options: DemoOptions) -> Result<ConnectionState> {
    let (sdk, handle) = MockCardReader::new();

    if options.failure == Some(Failure::Bluetooth) {
        handle.set_bluetooth_denied(true).await;
    }

    let readers = (0..options.readers)
        .map(demo_reader)
        .collect::<Result<Vec<_>>>()
        .context("building demo readers")?;

    let config = FlowConfig::default().with_connect_timeout(options.connect_timeout);
    let mut flow = ConnectionFlow::new(AnyCardReader::from(sdk), TracingPresenter, config);

    let (commands, mut rx) = mpsc::channel(8);
    let merchant = tokio::spawn(script(handle, readers, options.failure, commands));

    let state = flow.run(&mut rx).await?;
    merchant.abort();

    for transition in flow.machine().history() {
        debug!("{} -> {}", transition.from, transition.to);
    }
    info!("Session ended in {}", state.phase());

    Ok(state)
}
