use iced::widget::{button, container, row, text};
use iced::{Alignment, Element, Length};

use media_gallery::playback::{EngineKind, PlaybackStatus};

use crate::Message;

/// Playback panel above the grid
pub fn player_panel<'a>(
    status: PlaybackStatus,
    title: Option<&'a str>,
    can_download: bool,
) -> Element<'a, Message> {
    let headline = match (&status, title) {
        (PlaybackStatus::Idle, _) | (_, None) => "Select a video to play".to_string(),
        (PlaybackStatus::Loading, Some(title)) => format!("Starting {}...", title),
        (PlaybackStatus::Ready(EngineKind::Primary), Some(title)) => {
            format!("Playing {}", title)
        }
        (PlaybackStatus::Ready(EngineKind::Secondary), Some(title)) => {
            format!("Playing {} in the system player", title)
        }
        (PlaybackStatus::Failed(message), Some(title)) => format!("{}: {}", title, message),
    };

    let mut controls = row![text(headline).size(16).width(Length::Fill)]
        .spacing(8)
        .align_y(Alignment::Center);

    if matches!(status, PlaybackStatus::Failed(_)) {
        controls = controls.push(button("Retry").on_press(Message::Retry));
    }
    if can_download {
        controls = controls.push(button("Download").on_press(Message::Download));
    }
    if status != PlaybackStatus::Idle {
        controls = controls.push(
            button("Stop")
                .style(button::secondary)
                .on_press(Message::StopPlayback),
        );
    }

    container(controls)
        .padding(10)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}
