use crate::gui::{Message, WorkoutApp};
use iced::widget::{column, text};
use iced::{Alignment, Element};

pub fn view(app: &WorkoutApp) -> Element<'_, Message> {
    column![
        text("✓").size(96).style(text::secondary),
        text("Session Finished").size(40),
        text(format!(
            "{} rounds done. Great job!",
            app.session().total_rounds()
        ))
        .style(text::secondary),
    ]
    .spacing(16)
    .align_x(Alignment::Center)
    .into()
}
