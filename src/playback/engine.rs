use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::state::data::RecordId;

/// Generation counter of `initialize` calls.
///
/// Every engine signal and timer expiry carries the round it was created for,
/// so anything from a superseded round can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Round(u64);

impl Round {
    pub(crate) fn next(self) -> Round {
        Round(self.0 + 1)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolved URLs for one playback target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub target: RecordId,
    pub media_url: String,
    pub poster_url: String,
}

/// Asynchronous signals delivered back to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Primary engine loaded metadata
    PrimaryReady(Round),
    PrimaryError(Round, String),
    FallbackElapsed(Round),
    /// Runtime failure of the fallback engine
    SecondaryError(Round, String),
}

impl PlayerEvent {
    pub fn round(&self) -> Round {
        match self {
            PlayerEvent::PrimaryReady(round)
            | PlayerEvent::PrimaryError(round, _)
            | PlayerEvent::FallbackElapsed(round)
            | PlayerEvent::SecondaryError(round, _) => *round,
        }
    }
}

/// A live engine instance. `destroy` must release it completely.
pub trait PlaybackEngine {
    fn destroy(&mut self);
}

/// Builds engine instances for a round.
///
/// The primary engine starts asynchronously and reports readiness through
/// [`PlayerEvent::PrimaryReady`]. The secondary engine attaches and plays
/// synchronously; an `Err` from it is terminal.
pub trait EngineFactory {
    type Primary: PlaybackEngine;
    type Secondary: PlaybackEngine;

    fn start_primary(&mut self, round: Round, source: &MediaSource) -> Result<Self::Primary>;
    fn attach_secondary(&mut self, round: Round, source: &MediaSource) -> Result<Self::Secondary>;
}

/// One-shot timer delivering [`PlayerEvent::FallbackElapsed`] for a round
pub trait FallbackTimer {
    fn arm(&mut self, round: Round, after: Duration);
    fn cancel(&mut self, round: Round);
}
