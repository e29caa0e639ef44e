//! GUI module using iced
//!
//! Single-window front end over the session controller. The controller is
//! spawned inside a subscription stream; the app only forwards button presses
//! as commands and renders the snapshots it publishes.

use futures::SinkExt;
use iced::widget::container;
use iced::{Element, Length, Subscription, Task};
use tracing::{info, warn};

use crate::config::Config;
use crate::controller::{self, ControllerCommand};

// Sub-modules
pub mod app;
pub mod messages;
pub mod screens;
pub mod state;

// Re-exports for convenience
pub use app::WorkoutApp;
pub use messages::Message;
pub use state::Screen;

impl WorkoutApp {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::IncrementRounds => self.send(ControllerCommand::IncrementRounds),
            Message::DecrementRounds => self.send(ControllerCommand::DecrementRounds),
            Message::PlayPressed => self.send(ControllerCommand::Start),
            Message::TogglePause => self.send(ControllerCommand::TogglePause),
            Message::CancelPressed => self.send(ControllerCommand::Cancel),
            Message::ControllerReady(handle) => {
                info!("🔌 Session controller connected");
                self.session = handle.snapshot();
                self.controller = Some(handle);
                self.status = "Ready".to_string();
            }
            Message::ControllerFailed(reason) => {
                warn!("⚠️ Session controller failed: {}", reason);
                self.status = format!("Audio unavailable: {}", reason);
            }
            Message::SessionChanged(session) => {
                self.session = session;
            }
        }
        Task::none()
    }

    fn send(&self, command: ControllerCommand) {
        match &self.controller {
            Some(controller) => {
                if let Err(e) = controller.send(command) {
                    warn!("⚠️ {}", e);
                }
            }
            None => warn!("⚠️ Ignoring {:?}: controller not ready", command),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::run(session_worker)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let content = match Screen::for_session(&self.session) {
            Screen::Setup | Screen::Starting => screens::setup::view(self),
            Screen::Active => screens::active::view(self),
            Screen::Completed => screens::completed::view(self),
        };

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .padding(24)
            .into()
    }
}

/// Build the controller, announce it, then forward every session snapshot
fn session_worker() -> impl futures::Stream<Item = Message> {
    iced::stream::channel(100, |mut output| async move {
        let config = Config::load().unwrap_or_default();

        let (session_controller, handle) = match controller::from_config(&config).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Failed to start session controller: {}", e);
                let _ = output.send(Message::ControllerFailed(e.to_string())).await;
                return;
            }
        };

        let mut snapshots = handle.subscribe();
        let controller_task = session_controller.spawn();
        let _ = output.send(Message::ControllerReady(handle)).await;

        while snapshots.changed().await.is_ok() {
            let session = snapshots.borrow_and_update().clone();
            if output.send(Message::SessionChanged(session)).await.is_err() {
                break;
            }
        }

        let _ = controller_task.await;
    })
}
