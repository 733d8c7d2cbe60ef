//! Client engine for a personal media gallery server.
//!
//! - `state`: records, the collection state manager, preferences
//! - `render`: incremental batch rendering driven by visibility signals
//! - `playback`: primary/fallback playback bootstrap
//! - `controller`: wires user actions to the three
//! - `transport`, `config`, `logging`: the surrounding plumbing

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod playback;
pub mod render;
pub mod state;
pub mod transport;

pub use config::Config;
pub use controller::{GalleryController, Stats};
pub use error::{GalleryError, Result};
