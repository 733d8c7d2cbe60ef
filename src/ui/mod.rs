/// User interface module
///
/// Widgets composing the gallery window:
/// - Sort, filter, search and identity controls (toolbar.rs)
/// - Record cards for the grid (card.rs)
/// - Playback panel (player.rs)

pub mod card;
pub mod player;
pub mod toolbar;
