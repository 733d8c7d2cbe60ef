use iced::widget::{button, column, container, image, row, text};
use iced::{Alignment, Element, Length};

use media_gallery::state::data::MediaRecord;
use media_gallery::state::format;

use crate::Message;

const CARD_WIDTH: f32 = 240.0;
const THUMB_HEIGHT: f32 = 135.0;

/// One grid entry: thumbnail, title, derived attributes and actions
pub fn card<'a>(
    record: &'a MediaRecord,
    thumbnail: Option<&image::Handle>,
    now: i64,
) -> Element<'a, Message> {
    let preview: Element<'a, Message> = match thumbnail {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(THUMB_HEIGHT))
            .into(),
        None => container(text("Loading preview...").size(12))
            .width(Length::Fixed(CARD_WIDTH))
            .height(Length::Fixed(THUMB_HEIGHT))
            .center_x(Length::Fixed(CARD_WIDTH))
            .center_y(Length::Fixed(THUMB_HEIGHT))
            .style(container::rounded_box)
            .into(),
    };

    let details = text(format!(
        "{} | {} | {} | {}",
        record.quality,
        record.orientation,
        record.duration,
        format::megabytes(record.size_bytes)
    ))
    .size(12);

    let favorite = if record.favorite { "Unfavorite" } else { "Favorite" };

    let actions = row![
        button("Play").on_press(Message::Play(record.id.clone())),
        button(favorite)
            .style(button::secondary)
            .on_press(Message::ToggleFavorite(record.id.clone())),
        button("Delete")
            .style(button::danger)
            .on_press(Message::Delete(record.id.clone())),
    ]
    .spacing(6)
    .align_y(Alignment::Center);

    let content = column![
        button(preview)
            .padding(0)
            .style(button::text)
            .on_press(Message::Play(record.id.clone())),
        text(record.title.as_str()).size(14),
        details,
        text(format::relative_time(record.modified_at, now)).size(12),
        actions,
    ]
    .spacing(6)
    .width(Length::Fixed(CARD_WIDTH));

    container(content)
        .padding(8)
        .style(container::bordered_box)
        .into()
}
