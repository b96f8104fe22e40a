//! Reader discovery and connection flow.
//!
//! This crate turns the raw SDK contract from `cardpay-hardware` into the
//! merchant-facing connection flow:
//!
//! - [`ReaderConnectionStateMachine`]: validated transitions from scanning
//!   through reader selection to a connected reader, a failure, or a
//!   cancellation
//! - [`ConnectionSession`]: the readers found during one attempt
//! - [`AlertPresentationAdapter`]: keeps the alerts on screen in sync with
//!   the state
//! - [`ConnectionFlow`]: runs an attempt on one task, feeding SDK events and
//!   merchant commands to the state machine

pub mod alerts;
pub mod flow;
pub mod session;
pub mod state_machine;

pub use alerts::{
    ActionButton, AlertAction, AlertMessages, AlertPresentationAdapter, ModalPresenter,
    ModalSurface, PresentationRequest, SurfaceChange, presentation_for,
};
pub use flow::{ConnectionFlow, FlowCommand, FlowConfig};
pub use session::ConnectionSession;
pub use state_machine::{
    ConnectionPhase, ConnectionState, FailureResolution, ReaderConnectionStateMachine,
    StateMachineBuilder, StateTransition,
};
