use crate::gui::{Message, Screen, WorkoutApp};
use iced::widget::{button, column, container, row, text, Column, Space};
use iced::{Alignment, Element, Length};

pub fn view(app: &WorkoutApp) -> Element<'_, Message> {
    let session = app.session();
    let editable = app.is_ready() && session.is_editable();
    let starting = Screen::for_session(session) == Screen::Starting;

    let stepper = row![
        step_button("−", editable.then_some(Message::DecrementRounds)),
        container(text(session.total_rounds().to_string()).size(96))
            .center_x(Length::Fixed(140.0)),
        step_button("+", editable.then_some(Message::IncrementRounds)),
    ]
    .spacing(24)
    .align_y(Alignment::Center);

    let play_btn = button(
        container(text("PLAY").size(24))
            .center_x(Length::Fill)
            .padding(12),
    )
    .width(Length::Fill)
    .style(button::primary)
    .on_press_maybe(editable.then_some(Message::PlayPressed));

    let footer: Element<Message> = if starting {
        row![
            text(format!("Announcing round {}...", session.current_round()))
                .style(text::secondary),
            Space::with_width(Length::Fill),
            button(text("Cancel").size(12))
                .style(button::text)
                .on_press(Message::CancelPressed),
        ]
        .align_y(Alignment::Center)
        .into()
    } else {
        text(app.status()).size(12).style(text::secondary).into()
    };

    let error = session.last_error().map(|error| {
        container(text(error).size(12).style(text::danger))
            .padding(12)
            .center_x(Length::Fill)
            .style(container::rounded_box)
    });

    Column::new()
        .push(column![
            text("Workout Timer").size(56),
            text("MINIMALIST EXERCISE TIMER")
                .size(10)
                .style(text::secondary),
        ]
        .spacing(8)
        .align_x(Alignment::Center))
        .push(Space::with_height(24))
        .push(text("TOTAL ROUNDS").size(12).style(text::secondary))
        .push(stepper)
        .push(Space::with_height(24))
        .push(play_btn)
        .push_maybe(error)
        .push(footer)
        .spacing(16)
        .max_width(420)
        .align_x(Alignment::Center)
        .into()
}

fn step_button(label: &'static str, on_press: Option<Message>) -> Element<'static, Message> {
    button(container(text(label).size(32)).center_x(Length::Fixed(32.0)))
        .padding(12)
        .style(button::secondary)
        .on_press_maybe(on_press)
        .into()
}
