//! Reader connection state machine.
//!
//! This module drives one reader connection attempt, from the start of a
//! scan through reader selection to a connected reader, a failure, or a
//! cancellation. It is purely synchronous: the flow driver feeds it the
//! events coming from the SDK and from the merchant, one at a time.
//!
//! # States
//!
//! - `Idle`: No scan running
//! - `Scanning`: Scan running, readers are being collected
//! - `ReaderFound`: Exactly one reader was found, awaiting confirmation
//! - `ReadersFound`: Several readers were found, awaiting a choice
//! - `Connecting`: Connecting to the selected reader
//! - `Connected`: Connected (terminal)
//! - `Failed`: Scan or connection failed (terminal)
//! - `Cancelled`: The merchant cancelled (terminal)
//!
//! # Valid Transitions
//!
//! - Idle → Scanning → ReaderFound/ReadersFound → Connecting → Connected
//! - ReaderFound/ReadersFound → Scanning (keep searching)
//! - ReadersFound → ReadersFound (a reader was added to the list)
//! - Scanning/ReaderFound/ReadersFound/Connecting → Failed
//! - Any non-terminal state → Cancelled
//!
//! Terminal states only leave through [`reset`](ReaderConnectionStateMachine::reset).
//!
//! # Examples
//!
//! ```
//! use cardpay_connection::{ConnectionPhase, ReaderConnectionStateMachine};
//! use cardpay_core::ReaderId;
//! use cardpay_hardware::Reader;
//!
//! let mut machine = ReaderConnectionStateMachine::new();
//! machine.start_scan().unwrap();
//!
//! let id = ReaderId::new("CHB1").unwrap();
//! machine.reader_discovered(Reader::new(id.clone(), "Chipper")).unwrap();
//! machine.show_results().unwrap();
//! assert_eq!(machine.phase(), ConnectionPhase::ReaderFound);
//!
//! machine.select_reader(&id).unwrap();
//! assert_eq!(machine.phase(), ConnectionPhase::Connecting);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use cardpay_core::constants::MAX_TRANSITION_HISTORY;
use cardpay_core::{Error, ReaderId, Result};
use cardpay_hardware::{ConnectionError, DiscoveryError, Reader, ReaderError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::session::ConnectionSession;

/// Discriminant of [`ConnectionState`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    Idle,
    Scanning,
    ReaderFound,
    ReadersFound,
    Connecting,
    Connected,
    Failed,
    Cancelled,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            ConnectionPhase::Idle => "Idle",
            ConnectionPhase::Scanning => "Scanning",
            ConnectionPhase::ReaderFound => "ReaderFound",
            ConnectionPhase::ReadersFound => "ReadersFound",
            ConnectionPhase::Connecting => "Connecting",
            ConnectionPhase::Connected => "Connected",
            ConnectionPhase::Failed => "Failed",
            ConnectionPhase::Cancelled => "Cancelled",
        };
        write!(f, "{}", phase)
    }
}

impl ConnectionPhase {
    /// Check if a transition from this phase to `target` is valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardpay_connection::ConnectionPhase;
    ///
    /// assert!(ConnectionPhase::Idle.can_transition_to(&ConnectionPhase::Scanning));
    /// assert!(!ConnectionPhase::Idle.can_transition_to(&ConnectionPhase::Connected));
    /// ```
    pub fn can_transition_to(&self, target: &ConnectionPhase) -> bool {
        use ConnectionPhase::*;

        match (self, target) {
            (Idle, Scanning) => true,

            (Scanning, ReaderFound) | (Scanning, ReadersFound) => true,

            (ReaderFound, Connecting) | (ReaderFound, Scanning) => true,

            (ReadersFound, ReadersFound)
            | (ReadersFound, Connecting)
            | (ReadersFound, Scanning) => true,

            (Connecting, Connected) => true,

            (Scanning | ReaderFound | ReadersFound | Connecting, Failed) => true,

            (Idle | Scanning | ReaderFound | ReadersFound | Connecting, Cancelled) => true,

            _ => false,
        }
    }

    /// Whether the phase ends the connection attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectionPhase::Connected | ConnectionPhase::Failed | ConnectionPhase::Cancelled
        )
    }
}

/// How the merchant can resolve a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureResolution {
    /// Start over with a new scan.
    Retry,

    /// Grant the Bluetooth permission in the system settings.
    OpenSettings,
}

/// State of a reader connection attempt, with the data each state carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Scanning,
    ReaderFound(Reader),
    ReadersFound(Vec<Reader>),
    Connecting(Reader),
    Connected(Reader),
    Failed(ReaderError),
    Cancelled,
}

impl ConnectionState {
    /// The phase of this state.
    pub fn phase(&self) -> ConnectionPhase {
        match self {
            ConnectionState::Idle => ConnectionPhase::Idle,
            ConnectionState::Scanning => ConnectionPhase::Scanning,
            ConnectionState::ReaderFound(_) => ConnectionPhase::ReaderFound,
            ConnectionState::ReadersFound(_) => ConnectionPhase::ReadersFound,
            ConnectionState::Connecting(_) => ConnectionPhase::Connecting,
            ConnectionState::Connected(_) => ConnectionPhase::Connected,
            ConnectionState::Failed(_) => ConnectionPhase::Failed,
            ConnectionState::Cancelled => ConnectionPhase::Cancelled,
        }
    }

    /// Whether the state ends the connection attempt.
    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    /// How a failure can be resolved. `None` unless the state is `Failed`.
    pub fn failure_resolution(&self) -> Option<FailureResolution> {
        match self {
            ConnectionState::Failed(error) if error.requires_settings() => {
                Some(FailureResolution::OpenSettings)
            }
            ConnectionState::Failed(_) => Some(FailureResolution::Retry),
            _ => None,
        }
    }
}

/// Record of a state transition with timestamp.
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The phase transitioned from.
    pub from: ConnectionPhase,

    /// The phase transitioned to.
    pub to: ConnectionPhase,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    /// Create a new transition record stamped with the current time.
    pub fn new(from: ConnectionPhase, to: ConnectionPhase) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine for one reader discovery and connection attempt.
///
/// Event methods return `Ok(Some(transition))` when the state changed,
/// `Ok(None)` when the event was absorbed without a state change, and
/// `Err(Error::InvalidStateTransition)` when the event is not allowed in
/// the current state. A rejected event never changes the state.
///
/// # Thread Safety
///
/// The machine is not shared. The flow driver owns it and feeds it events
/// from a single task.
#[derive(Debug)]
pub struct ReaderConnectionStateMachine {
    /// Current state.
    state: ConnectionState,

    /// Readers and selection of the current attempt.
    session: ConnectionSession,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// History of state transitions (limited to MAX_TRANSITION_HISTORY).
    history: VecDeque<StateTransition>,
}

impl ReaderConnectionStateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            session: ConnectionSession::new(),
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
        }
    }

    /// Create a builder for a machine with custom configuration.
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    /// Get the current state.
    pub fn current_state(&self) -> &ConnectionState {
        &self.state
    }

    /// Get the current phase.
    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase()
    }

    /// Whether the attempt has ended.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The session of the current attempt.
    pub fn session(&self) -> &ConnectionSession {
        &self.session
    }

    /// Readers discovered so far, in discovery order.
    pub fn readers(&self) -> &[Reader] {
        self.session.readers()
    }

    /// The selected reader, if any.
    pub fn selected_reader(&self) -> Option<&Reader> {
        self.session.selected_reader()
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Get the transition history, ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Start scanning. Only valid from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` from any other state.
    pub fn start_scan(&mut self) -> Result<StateTransition> {
        self.transition_to(ConnectionState::Scanning)
    }

    /// Feed a reader announced by the SDK.
    ///
    /// - `Scanning`: the reader is tracked, no state change.
    /// - `ReaderFound`: the reader is tracked, the prompt stays on the
    ///   reader being offered.
    /// - `ReadersFound`: a new reader is appended to the visible list.
    /// - Any other state: the announcement is ignored.
    ///
    /// Duplicates are ignored in every state.
    pub fn reader_discovered(&mut self, reader: Reader) -> Result<Option<StateTransition>> {
        match self.state {
            ConnectionState::Scanning | ConnectionState::ReaderFound(_) => {
                if self.session.track(reader) {
                    debug!("Tracking reader #{}", self.session.len());
                }
                Ok(None)
            }
            ConnectionState::ReadersFound(_) => {
                if !self.session.track(reader) {
                    return Ok(None);
                }
                let readers = self.session.readers().to_vec();
                self.transition_to(ConnectionState::ReadersFound(readers))
                    .map(Some)
            }
            _ => {
                trace!("Ignoring reader {} in {}", reader.id, self.phase());
                Ok(None)
            }
        }
    }

    /// Present what the scan found so far.
    ///
    /// One reader leads to `ReaderFound`, several to `ReadersFound`. With no
    /// reader the machine keeps scanning and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless the machine is scanning.
    pub fn show_results(&mut self) -> Result<Option<StateTransition>> {
        if self.phase() != ConnectionPhase::Scanning {
            return Err(self.invalid(ConnectionPhase::ReadersFound));
        }

        let next = match self.session.readers() {
            [] => return Ok(None),
            [single] => ConnectionState::ReaderFound(single.clone()),
            several => ConnectionState::ReadersFound(several.to_vec()),
        };

        self.transition_to(next).map(Some)
    }

    /// Select the reader to connect to.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless a reader prompt or list
    /// is shown, and `Error::UnknownReader` if the reader is not offered.
    pub fn select_reader(&mut self, reader_id: &ReaderId) -> Result<StateTransition> {
        let offered = match &self.state {
            ConnectionState::ReaderFound(reader) => &reader.id == reader_id,
            ConnectionState::ReadersFound(readers) => {
                readers.iter().any(|reader| &reader.id == reader_id)
            }
            _ => return Err(self.invalid(ConnectionPhase::Connecting)),
        };

        if !offered {
            return Err(Error::UnknownReader(reader_id.to_string()));
        }

        let reader = self.session.select(reader_id)?.clone();
        info!("Connecting to reader {}", reader.display_name());
        self.transition_to(ConnectionState::Connecting(reader))
    }

    /// Dismiss the reader prompt or list and keep scanning.
    ///
    /// Readers found so far stay tracked.
    pub fn continue_searching(&mut self) -> Result<StateTransition> {
        self.transition_to(ConnectionState::Scanning)
    }

    /// Record a successful connection.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless connecting, and
    /// `Error::UnknownReader` if `reader` is not the selected one.
    pub fn connection_succeeded(&mut self, reader: Reader) -> Result<StateTransition> {
        if self.phase() != ConnectionPhase::Connecting {
            return Err(self.invalid(ConnectionPhase::Connected));
        }
        if self.session.selected() != Some(&reader.id) {
            return Err(Error::UnknownReader(reader.id.to_string()));
        }

        info!("Connected to reader {}", reader.display_name());
        self.transition_to(ConnectionState::Connected(reader))
    }

    /// Record a failed connection.
    pub fn connection_failed(&mut self, error: ConnectionError) -> Result<StateTransition> {
        if self.phase() != ConnectionPhase::Connecting {
            return Err(self.invalid(ConnectionPhase::Failed));
        }

        info!("Reader connection failed: {}", error);
        self.transition_to(ConnectionState::Failed(error.into()))
    }

    /// Record a failed scan.
    pub fn discovery_failed(&mut self, error: DiscoveryError) -> Result<StateTransition> {
        if self.phase() == ConnectionPhase::Connecting {
            return Err(self.invalid(ConnectionPhase::Failed));
        }

        info!("Reader discovery failed: {}", error);
        self.transition_to(ConnectionState::Failed(error.into()))
    }

    /// Cancel the attempt.
    ///
    /// Returns `None` if the attempt already ended. Cancelling releases the
    /// session's cancellation token.
    pub fn cancel(&mut self) -> Option<StateTransition> {
        if self.is_terminal() {
            return None;
        }

        info!("Reader connection cancelled in {}", self.phase());
        self.transition_to(ConnectionState::Cancelled).ok()
    }

    /// Reset to `Idle` with a fresh session, regardless of the current state.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.phase(), ConnectionPhase::Idle);
        self.session.cancel();
        self.session = ConnectionSession::new();
        self.perform_state_change(ConnectionState::Idle, transition.clone());
        transition
    }

    fn transition_to(&mut self, new_state: ConnectionState) -> Result<StateTransition> {
        let from = self.phase();
        let to = new_state.phase();

        if !from.can_transition_to(&to) {
            return Err(self.invalid(to));
        }

        let transition = StateTransition::new(from, to);
        self.perform_state_change(new_state, transition.clone());

        Ok(transition)
    }

    fn perform_state_change(&mut self, new_state: ConnectionState, transition: StateTransition) {
        debug!(
            session = %self.session.id(),
            "Reader connection {} -> {}",
            transition.from,
            transition.to
        );

        self.state = new_state;
        self.state_entered_at = Instant::now();

        if self.state.is_terminal() {
            self.session.cancel();
        }

        self.add_to_history(transition);
    }

    fn add_to_history(&mut self, transition: StateTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }
    }

    fn invalid(&self, to: ConnectionPhase) -> Error {
        Error::InvalidStateTransition {
            from: self.phase().to_string(),
            to: to.to_string(),
        }
    }
}

impl Default for ReaderConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ReaderConnectionStateMachine`].
///
/// Mostly useful in tests that need a machine with pre-populated history.
#[derive(Debug)]
pub struct StateMachineBuilder {
    history: VecDeque<StateTransition>,
    session: Option<ConnectionSession>,
}

impl StateMachineBuilder {
    /// Set pre-populated history.
    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    /// Use an existing session, e.g. one whose token is linked to a parent.
    pub fn with_session(mut self, session: ConnectionSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the machine in the Idle state.
    pub fn build(self) -> ReaderConnectionStateMachine {
        let mut history = self.history;
        while history.len() > MAX_TRANSITION_HISTORY {
            history.pop_front();
        }

        ReaderConnectionStateMachine {
            state: ConnectionState::Idle,
            session: self.session.unwrap_or_default(),
            state_entered_at: Instant::now(),
            history,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
            session: None,
        }
    }
}
