//! Workout Timer Launcher - GUI Application
//!
//! Run with: cargo run --bin workout-timer-launcher

use iced::application;

use workout_timer::config::Config;
use workout_timer::gui::WorkoutApp;
use workout_timer::logging;

fn main() -> iced::Result {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = logging::init(false, &config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    application(WorkoutApp::title, WorkoutApp::update, WorkoutApp::view)
        .theme(WorkoutApp::theme)
        .subscription(WorkoutApp::subscription)
        .scale_factor(WorkoutApp::scale_factor)
        .run_with(WorkoutApp::new)
}
