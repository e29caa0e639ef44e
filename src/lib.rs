//! Workout Timer Library
//!
//! Core modules for the round-based workout timer: the session state
//! machine, its async controller, cue playback and round announcements.

pub mod audio;
pub mod config;
pub mod controller;
pub mod error;
pub mod gui;
pub mod logging;
pub mod session;
pub mod tts;

pub use controller::{ControllerCommand, ControllerHandle, SessionController};
pub use session::{Session, SessionStatus};
