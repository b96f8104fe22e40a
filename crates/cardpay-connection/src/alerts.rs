//! Merchant-facing alerts for the reader connection flow.
//!
//! Every [`ConnectionState`] maps to at most one modal. The
//! [`AlertPresentationAdapter`] keeps track of what is on screen and turns
//! state changes into present / update / dismiss calls on a
//! [`ModalPresenter`]:
//!
//! - the same surface stays on screen: its content is updated in place
//! - a different surface is needed: the current one is dismissed first
//! - the state needs no modal: whatever is shown is dismissed
//!
//! The reader list is its own surface, so switching between the single
//! reader prompt and the list always dismisses one before presenting the
//! other.

use cardpay_hardware::{ConnectionError, DiscoveryError, Reader, ReaderError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state_machine::{ConnectionPhase, ConnectionState};

/// Alert texts shown during reader discovery and connection.
pub struct AlertMessages;

impl AlertMessages {
    pub const SCANNING_TITLE: &'static str = "Scanning for reader";
    pub const SCANNING_MESSAGE: &'static str = "Press the power button of your reader";

    /// Prefix of the single reader prompt; the reader name follows.
    pub const CONNECT_PROMPT_TITLE: &'static str = "Do you want to connect to reader";

    pub const SEVERAL_READERS_TITLE: &'static str = "Several readers found";
    pub const SEVERAL_READERS_MESSAGE: &'static str = "Select the reader to connect to";

    pub const CONNECTING_TITLE: &'static str = "Connecting to reader";
    pub const CONNECTING_MESSAGE: &'static str = "Please wait";

    pub const BLUETOOTH_REQUIRED_TITLE: &'static str = "Bluetooth permission required";
    pub const BLUETOOTH_REQUIRED_MESSAGE: &'static str =
        "Allow Bluetooth access in Settings to connect a card reader";

    pub const SCANNING_FAILED_TITLE: &'static str = "Scanning failed";
    pub const CONNECTING_FAILED_TITLE: &'static str = "Unable to connect to reader";

    pub const READER_UNREACHABLE_MESSAGE: &'static str =
        "Make sure the reader is charged and within range";
    pub const CONNECT_TIMEOUT_MESSAGE: &'static str = "The reader did not respond in time";

    pub const CONNECT: &'static str = "Connect to Reader";
    pub const KEEP_SEARCHING: &'static str = "Keep Searching";
    pub const CANCEL: &'static str = "Cancel";
    pub const TRY_AGAIN: &'static str = "Try Again";
    pub const OPEN_SETTINGS: &'static str = "Open Settings";
    pub const CLOSE: &'static str = "Dismiss";
}

/// Where a presentation is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalSurface {
    /// The common modal used for progress, prompts and failures.
    Modal,

    /// The several-readers list.
    ReaderList,
}

/// What pressing a button asks the flow to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    Connect,
    ContinueSearching,
    Cancel,
    Retry,
    OpenSettings,
    Close,
}

/// A labelled button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub action: AlertAction,
    pub label: String,
}

impl ActionButton {
    fn new(action: AlertAction, label: &str) -> Self {
        Self {
            action,
            label: label.to_string(),
        }
    }
}

/// Everything a presenter needs to render one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationRequest {
    pub phase: ConnectionPhase,
    pub surface: ModalSurface,
    pub title: String,
    pub message: Option<String>,

    /// Readers to list, in discovery order. Only set for the reader list.
    pub readers: Vec<Reader>,

    pub primary_action: Option<ActionButton>,
    pub secondary_action: Option<ActionButton>,
}

impl PresentationRequest {
    fn modal(phase: ConnectionPhase, title: impl Into<String>) -> Self {
        Self {
            phase,
            surface: ModalSurface::Modal,
            title: title.into(),
            message: None,
            readers: Vec::new(),
            primary_action: None,
            secondary_action: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn with_primary(mut self, action: AlertAction, label: &str) -> Self {
        self.primary_action = Some(ActionButton::new(action, label));
        self
    }

    fn with_secondary(mut self, action: AlertAction, label: &str) -> Self {
        self.secondary_action = Some(ActionButton::new(action, label));
        self
    }
}

/// Map a connection state to the alert it needs.
///
/// `None` means nothing should be on screen.
pub fn presentation_for(state: &ConnectionState) -> Option<PresentationRequest> {
    let phase = state.phase();

    let request = match state {
        ConnectionState::Idle | ConnectionState::Connected(_) | ConnectionState::Cancelled => {
            return None;
        }

        ConnectionState::Scanning => PresentationRequest::modal(phase, AlertMessages::SCANNING_TITLE)
            .with_message(AlertMessages::SCANNING_MESSAGE)
            .with_secondary(AlertAction::Cancel, AlertMessages::CANCEL),

        ConnectionState::ReaderFound(reader) => PresentationRequest::modal(
            phase,
            format!("{} {}", AlertMessages::CONNECT_PROMPT_TITLE, reader.display_name()),
        )
        .with_primary(AlertAction::Connect, AlertMessages::CONNECT)
        .with_secondary(AlertAction::ContinueSearching, AlertMessages::KEEP_SEARCHING),

        ConnectionState::ReadersFound(readers) => PresentationRequest {
            phase,
            surface: ModalSurface::ReaderList,
            title: AlertMessages::SEVERAL_READERS_TITLE.to_string(),
            message: Some(AlertMessages::SEVERAL_READERS_MESSAGE.to_string()),
            readers: readers.clone(),
            primary_action: None,
            secondary_action: Some(ActionButton::new(AlertAction::Cancel, AlertMessages::CANCEL)),
        },

        ConnectionState::Connecting(reader) => {
            PresentationRequest::modal(phase, AlertMessages::CONNECTING_TITLE)
                .with_message(format!("{} {}", AlertMessages::CONNECTING_MESSAGE, reader.display_name()))
        }

        ConnectionState::Failed(error) => failure_presentation(phase, error),
    };

    Some(request)
}

fn failure_presentation(phase: ConnectionPhase, error: &ReaderError) -> PresentationRequest {
    if error.requires_settings() {
        return PresentationRequest::modal(phase, AlertMessages::BLUETOOTH_REQUIRED_TITLE)
            .with_message(AlertMessages::BLUETOOTH_REQUIRED_MESSAGE)
            .with_primary(AlertAction::OpenSettings, AlertMessages::OPEN_SETTINGS)
            .with_secondary(AlertAction::Close, AlertMessages::CLOSE);
    }

    match error {
        ReaderError::Discovery(discovery) => {
            let message = match discovery {
                DiscoveryError::ScanFailed(cause) => cause.clone(),
                other => other.to_string(),
            };
            PresentationRequest::modal(phase, AlertMessages::SCANNING_FAILED_TITLE)
                .with_message(message)
                .with_primary(AlertAction::Close, AlertMessages::CLOSE)
        }
        ReaderError::Connection(connection) => {
            let message = match connection {
                ConnectionError::Timeout => AlertMessages::CONNECT_TIMEOUT_MESSAGE,
                _ => AlertMessages::READER_UNREACHABLE_MESSAGE,
            };
            PresentationRequest::modal(phase, AlertMessages::CONNECTING_FAILED_TITLE)
                .with_message(message)
                .with_primary(AlertAction::Retry, AlertMessages::TRY_AGAIN)
                .with_secondary(AlertAction::Cancel, AlertMessages::CANCEL)
        }
    }
}

/// Rendering backend for alerts, e.g. a UI toolkit or a terminal.
pub trait ModalPresenter: Send {
    /// Show a new surface.
    fn present(&mut self, request: &PresentationRequest);

    /// Replace the content of the surface already on screen.
    fn update(&mut self, request: &PresentationRequest);

    /// Remove a surface from the screen.
    fn dismiss(&mut self, surface: ModalSurface);
}

/// What [`AlertPresentationAdapter::render`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceChange {
    /// Nothing to do, the screen already shows the right thing.
    Unchanged,
    Presented(ModalSurface),
    Updated(ModalSurface),
    Replaced {
        dismissed: ModalSurface,
        presented: ModalSurface,
    },
    Dismissed(ModalSurface),
}

/// Keeps the screen in sync with the connection state.
#[derive(Debug)]
pub struct AlertPresentationAdapter<P> {
    presenter: P,
    current: Option<PresentationRequest>,
}

impl<P: ModalPresenter> AlertPresentationAdapter<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            current: None,
        }
    }

    /// Render `state`, issuing the minimal presenter calls.
    pub fn render(&mut self, state: &ConnectionState) -> SurfaceChange {
        let next = presentation_for(state);

        let change = match (self.current.as_ref(), next.as_ref()) {
            (None, None) => SurfaceChange::Unchanged,
            (Some(shown), Some(request)) if shown == request => SurfaceChange::Unchanged,
            (None, Some(request)) => {
                self.presenter.present(request);
                SurfaceChange::Presented(request.surface)
            }
            (Some(shown), Some(request)) if shown.surface == request.surface => {
                self.presenter.update(request);
                SurfaceChange::Updated(request.surface)
            }
            (Some(shown), Some(request)) => {
                self.presenter.dismiss(shown.surface);
                self.presenter.present(request);
                SurfaceChange::Replaced {
                    dismissed: shown.surface,
                    presented: request.surface,
                }
            }
            (Some(shown), None) => {
                self.presenter.dismiss(shown.surface);
                SurfaceChange::Dismissed(shown.surface)
            }
        };

        if change != SurfaceChange::Unchanged {
            debug!("Alert for {}: {:?}", state.phase(), change);
        }

        self.current = next;
        change
    }

    /// Dismiss whatever is on screen.
    pub fn dismiss_all(&mut self) -> Option<ModalSurface> {
        let shown = self.current.take()?;
        self.presenter.dismiss(shown.surface);
        Some(shown.surface)
    }

    /// The request currently on screen, if any.
    pub fn current(&self) -> Option<&PresentationRequest> {
        self.current.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }
}
