use std::fmt;

use iced::widget::{button, checkbox, pick_list, row, text, text_input};
use iced::{Alignment, Element, Length};

use media_gallery::state::collection::{FilterConfig, SortConfig, SortDirection, SortKey};
use media_gallery::state::data::{Orientation, Quality};

use crate::Message;

/// Pick list entry for an optional filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    Any,
    Only(T),
}

impl<T> Choice<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Choice::Any => None,
            Choice::Only(value) => Some(value),
        }
    }

    fn from_option(value: Option<T>) -> Self {
        value.map_or(Choice::Any, Choice::Only)
    }

    fn options(all: &[T]) -> Vec<Choice<T>>
    where
        T: Copy,
    {
        std::iter::once(Choice::Any)
            .chain(all.iter().copied().map(Choice::Only))
            .collect()
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Any => write!(f, "All"),
            Choice::Only(value) => value.fmt(f),
        }
    }
}

/// Sorting and filtering controls, search box and identity field
pub fn toolbar<'a>(
    sort: SortConfig,
    filter: FilterConfig,
    search: &'a str,
    identity: &'a str,
    busy: bool,
) -> Element<'a, Message> {
    let direction = match sort.direction {
        SortDirection::Ascending => "Ascending",
        SortDirection::Descending => "Descending",
    };

    let sorting = row![
        text("Sort"),
        pick_list(&SortKey::ALL[..], sort.key, Message::SortKeyChanged).placeholder("None"),
        button(direction).on_press(Message::SortDirectionToggled),
        checkbox("Favorites first", sort.favorites_first)
            .on_toggle(Message::FavoritesFirstToggled),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let filtering = row![
        text("Orientation"),
        pick_list(
            Choice::options(&Orientation::ALL),
            Some(Choice::from_option(filter.orientation)),
            Message::OrientationChanged,
        ),
        text("Quality"),
        pick_list(
            Choice::options(&Quality::ALL),
            Some(Choice::from_option(filter.quality)),
            Message::QualityChanged,
        ),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    let refresh = button("Refresh").on_press_maybe((!busy).then_some(Message::Refresh));
    let rescan = button("Rescan library").on_press_maybe((!busy).then_some(Message::Rescan));

    let controls = row![
        text_input("Search titles", search)
            .on_input(Message::SearchChanged)
            .width(Length::Fixed(220.0)),
        refresh,
        rescan,
        text_input("Your name", identity)
            .on_input(Message::IdentityChanged)
            .on_submit(Message::IdentitySubmitted)
            .width(Length::Fixed(160.0)),
        button("Set name").on_press(Message::IdentitySubmitted),
    ]
    .spacing(8)
    .align_y(Alignment::Center);

    iced::widget::column![sorting, filtering, controls]
        .spacing(8)
        .into()
}
