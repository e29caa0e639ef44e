//! Main application state for the workout timer GUI
//!
//! Contains the WorkoutApp struct and initialization logic.

use iced::Task;
use tracing::info;

use crate::config::Config;
use crate::controller::ControllerHandle;
use crate::session::Session;

use super::messages::Message;

/// Main application state
pub struct WorkoutApp {
    /// Latest session snapshot from the controller
    pub(crate) session: Session,
    /// Connection to the session controller, once it is running
    pub(crate) controller: Option<ControllerHandle>,
    /// Status line shown under the setup controls
    pub(crate) status: String,
    /// Configuration
    pub(crate) config: Config,
}

impl WorkoutApp {
    /// Create a new WorkoutApp instance
    pub fn new() -> (Self, Task<Message>) {
        let config = Config::load().unwrap_or_default();
        info!("🚀 Workout Timer app initialized");
        (Self::with_config(config), Task::none())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            session: Session::new(config.default_rounds),
            controller: None,
            status: "Loading audio...".to_string(),
            config,
        }
    }

    /// Application title
    pub fn title(&self) -> String {
        "Workout Timer".to_string()
    }

    /// Application theme
    pub fn theme(&self) -> iced::Theme {
        iced::Theme::Light
    }

    pub fn scale_factor(&self) -> f64 {
        self.config.gui_scaling
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// True once the controller is connected
    pub fn is_ready(&self) -> bool {
        self.controller.is_some()
    }
}
