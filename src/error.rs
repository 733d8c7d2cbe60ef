//! Error types shared by the gallery core.
//!
//! Transport and preference failures are reported to the controller and leave
//! core state untouched. Primary playback failures are recovered internally by
//! the playback state machine; only terminal failures reach the user.

use crate::state::data::RecordId;

/// Unified error type for the gallery core
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// Network failure or non-success HTTP status
    #[error("Transport error{}: {}", status_suffix(.status), .message)]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Delete attempted without a valid identity
    #[error("Unauthorized")]
    Unauthorized,

    /// Operation on an id absent from the current collection or view
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// Identity rejected (empty or unchanged)
    #[error("Invalid or already existing identity")]
    InvalidIdentity,

    /// Primary engine timed out or failed; recovered through the fallback engine
    #[error("Primary playback failed: {0}")]
    PlaybackPrimaryFailure(String),

    /// Fallback engine failed as well
    #[error("Playback failed: {0}")]
    PlaybackTerminalFailure(String),

    #[error("Preference store error: {0}")]
    Preferences(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GalleryError {
    /// Whether the controller should surface this error as a notification.
    ///
    /// Primary playback failures never reach the user and a missing record is
    /// a soft, loggable condition.
    pub fn is_user_visible(&self) -> bool {
        !matches!(
            self,
            GalleryError::PlaybackPrimaryFailure(_) | GalleryError::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for GalleryError {
    fn from(err: reqwest::Error) -> Self {
        GalleryError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
