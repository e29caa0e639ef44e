//! Message types for the workout timer GUI
//!
//! All messages that can be sent to update the application state.

use crate::controller::ControllerHandle;
use crate::session::Session;

/// Messages that drive the application
#[derive(Debug, Clone)]
pub enum Message {
    // Setup
    IncrementRounds,
    DecrementRounds,
    PlayPressed,

    // Active workout
    TogglePause,
    CancelPressed,

    // Controller
    ControllerReady(ControllerHandle),
    ControllerFailed(String),
    SessionChanged(Session),
}
