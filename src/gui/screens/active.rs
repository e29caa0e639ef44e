use crate::gui::{Message, WorkoutApp};
use crate::session::SessionStatus;
use iced::widget::{button, column, container, progress_bar, row, text, Space};
use iced::{Alignment, Element, Length};

pub fn view(app: &WorkoutApp) -> Element<'_, Message> {
    let session = app.session();

    let round = row![
        text(session.current_round().to_string()).size(96),
        text("/").size(32).style(text::secondary),
        text(session.total_rounds().to_string())
            .size(40)
            .style(text::secondary),
    ]
    .spacing(12)
    .align_y(Alignment::End);

    let toggle_label = if session.status() == SessionStatus::Playing {
        "⏸  Pause"
    } else {
        "▶  Resume"
    };
    let toggle = button(container(text(toggle_label).size(28)).center_x(Length::Fixed(200.0)))
        .padding(24)
        .style(button::primary)
        .on_press(Message::TogglePause);

    let error = session
        .last_error()
        .map(|error| text(error).size(12).style(text::danger));

    column![
        text("ROUND").size(10).style(text::secondary),
        round,
        Space::with_height(24),
        progress_bar(0.0..=100.0, session.progress_percent() as f32).height(Length::Fixed(6.0)),
        Space::with_height(24),
        toggle,
    ]
    .push_maybe(error)
    .push(
        button(text("CANCEL WORKOUT").size(10))
            .style(button::text)
            .on_press(Message::CancelPressed),
    )
    .spacing(16)
    .max_width(420)
    .align_x(Alignment::Center)
    .into()
}
