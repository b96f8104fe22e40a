//! Connection flow driver.
//!
//! [`ConnectionFlow`] owns the SDK channel, the state machine and the alert
//! adapter, and runs one connection attempt on a single task. SDK events
//! and merchant commands are multiplexed with `tokio::select!`, so the
//! state machine only ever sees one event at a time.
//!
//! ```text
//! ┌──────────────┐ DiscoveryEvent ┌──────────────────┐ render  ┌───────────┐
//! │ SDK channel  │───────────────►│                  │────────►│ Presenter │
//! └──────────────┘                │  ConnectionFlow  │         └───────────┘
//! ┌──────────────┐  FlowCommand   │  (one task)      │
//! │ Merchant UI  │───────────────►│                  │
//! └──────────────┘                └──────────────────┘
//! ```

use std::time::Duration;

use cardpay_core::constants::DEFAULT_CONNECT_TIMEOUT_MS;
use cardpay_core::{ReaderId, Result};
use cardpay_hardware::{
    ConnectionError, DiscoveryEvent, DiscoveryStream, Reader, ReaderDiscoveryChannel,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::alerts::{AlertPresentationAdapter, ModalPresenter};
use crate::state_machine::{ConnectionPhase, ConnectionState, ReaderConnectionStateMachine};

/// Merchant input to a running flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCommand {
    /// Leave the scanning modal and show what was found.
    ShowResults,

    /// Connect to the given reader.
    SelectReader(ReaderId),

    /// Dismiss the prompt or list and keep scanning.
    ContinueSearching,

    /// Abandon the attempt.
    Cancel,
}

/// Flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Upper bound for one connect call.
    pub connect_timeout: Duration,
}

impl FlowConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

enum ConnectOutcome {
    Connected(Reader),
    Failed(ConnectionError),
    Cancelled,
}

/// Runs reader connection attempts.
///
/// # Examples
///
/// ```no_run
/// use cardpay_connection::{ConnectionFlow, FlowCommand, FlowConfig, ModalPresenter};
/// use cardpay_hardware::mock::MockCardReader;
/// use tokio::sync::mpsc;
///
/// async fn connect<P: ModalPresenter>(presenter: P) {
///     let (sdk, _handle) = MockCardReader::new();
///     let mut flow = ConnectionFlow::new(sdk, presenter, FlowConfig::default());
///
///     let (commands, mut rx) = mpsc::channel(8);
///     commands.send(FlowCommand::ShowResults).await.unwrap();
///
///     let state = flow.run(&mut rx).await.unwrap();
///     println!("Flow ended in {}", state.phase());
/// }
/// ```
pub struct ConnectionFlow<C, P> {
    channel: C,
    machine: ReaderConnectionStateMachine,
    alerts: AlertPresentationAdapter<P>,
    config: FlowConfig,
}

impl<C, P> ConnectionFlow<C, P>
where
    C: ReaderDiscoveryChannel,
    P: ModalPresenter,
{
    pub fn new(channel: C, presenter: P, config: FlowConfig) -> Self {
        Self {
            channel,
            machine: ReaderConnectionStateMachine::new(),
            alerts: AlertPresentationAdapter::new(presenter),
            config,
        }
    }

    /// Run one attempt until it connects, fails, or is cancelled.
    ///
    /// A closed command channel counts as a cancellation. The discovery
    /// scan is always stopped before returning.
    ///
    /// # Errors
    ///
    /// Only returns an error if the state machine rejects the start of the
    /// scan, which cannot happen after the internal reset.
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<FlowCommand>) -> Result<ConnectionState> {
        if self.machine.phase() != ConnectionPhase::Idle {
            self.machine.reset();
        }

        self.machine.start_scan()?;
        self.render();
        info!(session = %self.machine.session().id(), "Starting reader discovery");

        let mut events = match self.channel.start_discovery().await {
            Ok(events) => Some(events),
            Err(error) => {
                self.machine.discovery_failed(error)?;
                None
            }
        };

        while !self.machine.is_terminal() {
            if let ConnectionState::Connecting(reader) = self.machine.current_state() {
                let reader_id = reader.id.clone();
                self.connect(&reader_id, commands).await?;
            } else if self.next_event(events.as_mut(), commands).await? {
                // The SDK stopped the scan on its own. Keep the current
                // state; the merchant can still pick from what was found.
                debug!("Discovery stream ended");
                events = None;
            }
            self.render();
        }

        if let Some(events) = events.as_ref() {
            events.cancel();
        }
        self.channel.cancel_discovery().await;
        self.render();

        Ok(self.machine.current_state().clone())
    }

    /// Handle the next command or discovery event. Returns `true` when the
    /// discovery stream ended.
    async fn next_event(
        &mut self,
        events: Option<&mut DiscoveryStream>,
        commands: &mut mpsc::Receiver<FlowCommand>,
    ) -> Result<bool> {
        let event = match events {
            // SDK events queued before a command are applied first
            Some(events) => tokio::select! {
                biased;
                event = events.recv() => event,
                command = commands.recv() => {
                    self.handle_command(command);
                    return Ok(false);
                }
            },
            None => {
                let command = commands.recv().await;
                self.handle_command(command);
                return Ok(false);
            }
        };

        match event {
            Some(DiscoveryEvent::ReaderFound(reader)) => {
                self.machine.reader_discovered(reader)?;
            }
            Some(DiscoveryEvent::Failed(error)) => {
                self.machine.discovery_failed(error)?;
            }
            Some(other) => debug!("Ignoring discovery event {:?}", other),
            None => return Ok(true),
        }

        Ok(false)
    }

    fn handle_command(&mut self, command: Option<FlowCommand>) {
        let result = match command {
            Some(FlowCommand::ShowResults) => self.machine.show_results().map(|_| ()),
            Some(FlowCommand::SelectReader(reader_id)) => {
                self.machine.select_reader(&reader_id).map(|_| ())
            }
            Some(FlowCommand::ContinueSearching) => self.machine.continue_searching().map(|_| ()),
            Some(FlowCommand::Cancel) => {
                self.machine.cancel();
                Ok(())
            }
            None => {
                debug!("Command channel closed, cancelling");
                self.machine.cancel();
                Ok(())
            }
        };

        if let Err(error) = result {
            warn!("Ignoring command in {}: {}", self.machine.phase(), error);
        }
    }

    async fn connect(
        &mut self,
        reader_id: &ReaderId,
        commands: &mut mpsc::Receiver<FlowCommand>,
    ) -> Result<()> {
        let token = self.machine.session().token().clone();
        let timeout = self.config.connect_timeout;

        let outcome = {
            let connect = tokio::time::timeout(timeout, self.channel.connect(reader_id));
            tokio::pin!(connect);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break ConnectOutcome::Cancelled,
                    command = commands.recv() => match command {
                        Some(FlowCommand::Cancel) | None => break ConnectOutcome::Cancelled,
                        Some(other) => debug!("Ignoring {:?} while connecting", other),
                    },
                    result = &mut connect => break match result {
                        Ok(Ok(reader)) => ConnectOutcome::Connected(reader),
                        Ok(Err(error)) => ConnectOutcome::Failed(error),
                        Err(_) => ConnectOutcome::Failed(ConnectionError::Timeout),
                    },
                }
            }
        };

        match outcome {
            ConnectOutcome::Connected(reader) => {
                self.machine.connection_succeeded(reader)?;
            }
            ConnectOutcome::Failed(error) => {
                self.machine.connection_failed(error)?;
            }
            ConnectOutcome::Cancelled => {
                self.machine.cancel();
            }
        }

        Ok(())
    }

    fn render(&mut self) {
        self.alerts.render(self.machine.current_state());
    }

    /// The state machine of the current or last attempt.
    pub fn machine(&self) -> &ReaderConnectionStateMachine {
        &self.machine
    }

    pub fn alerts(&self) -> &AlertPresentationAdapter<P> {
        &self.alerts
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }
}
