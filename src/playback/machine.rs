use std::mem;
use std::time::Duration;

use super::engine::{EngineFactory, FallbackTimer, MediaSource, PlaybackEngine, PlayerEvent, Round};
use crate::error::GalleryError;
use crate::state::data::RecordId;

/// Which engine is presenting the media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Primary,
    Secondary,
}

enum ActiveEngine<P, S> {
    Primary(P),
    Secondary(S),
}

impl<P: PlaybackEngine, S: PlaybackEngine> ActiveEngine<P, S> {
    fn kind(&self) -> EngineKind {
        match self {
            ActiveEngine::Primary(_) => EngineKind::Primary,
            ActiveEngine::Secondary(_) => EngineKind::Secondary,
        }
    }

    fn destroy(&mut self) {
        match self {
            ActiveEngine::Primary(engine) => engine.destroy(),
            ActiveEngine::Secondary(engine) => engine.destroy(),
        }
    }
}

enum Phase<P, S> {
    Idle,
    Loading { primary: P },
    Ready { engine: ActiveEngine<P, S> },
    Failed { message: String },
}

/// Observable playback state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Ready(EngineKind),
    Failed(String),
}

/// Brings a playable surface for one target into `Ready`.
///
/// The primary engine races a fallback timer; on timeout or primary error the
/// secondary engine takes over, at most once per round. `initialize` always
/// starts a new round, so signals and timers from older rounds are ignored.
pub struct PlaybackMachine<F: EngineFactory, T> {
    factory: F,
    timer: T,
    timeout: Duration,
    round: Round,
    source: Option<MediaSource>,
    phase: Phase<F::Primary, F::Secondary>,
}

impl<F: EngineFactory, T: FallbackTimer> PlaybackMachine<F, T> {
    pub fn new(factory: F, timer: T, timeout: Duration) -> Self {
        Self {
            factory,
            timer,
            timeout,
            round: Round::default(),
            source: None,
            phase: Phase::Idle,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        match &self.phase {
            Phase::Idle => PlaybackStatus::Idle,
            Phase::Loading { .. } => PlaybackStatus::Loading,
            Phase::Ready { engine } => PlaybackStatus::Ready(engine.kind()),
            Phase::Failed { message } => PlaybackStatus::Failed(message.clone()),
        }
    }

    pub fn target(&self) -> Option<&RecordId> {
        self.source.as_ref().map(|s| &s.target)
    }

    /// Media URL for the download affordance, only while `Ready`
    pub fn download_url(&self) -> Option<&str> {
        match self.phase {
            Phase::Ready { .. } => self.source.as_ref().map(|s| s.media_url.as_str()),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Start a new round for `source`, tearing down whatever came before
    pub fn initialize(&mut self, source: MediaSource) -> Round {
        self.teardown();

        self.round = self.round.next();
        let round = self.round;
        tracing::info!("Playback {} starting for {}", round, source.target);

        self.timer.arm(round, self.timeout);
        match self.factory.start_primary(round, &source) {
            Ok(primary) => {
                self.source = Some(source);
                self.phase = Phase::Loading { primary };
            }
            Err(err) => {
                self.source = Some(source);
                self.fall_back(reason(err));
            }
        }
        round
    }

    /// Re-run `initialize` for the current target
    pub fn retry(&mut self) -> Option<Round> {
        let source = self.source.clone()?;
        Some(self.initialize(source))
    }

    /// Tear everything down and forget the target
    pub fn stop(&mut self) {
        self.teardown();
        self.source = None;
    }

    pub fn handle(&mut self, event: PlayerEvent) {
        if event.round() != self.round {
            tracing::debug!("Dropping {:?} from superseded round", event);
            return;
        }
        match event {
            PlayerEvent::PrimaryReady(_) => self.on_primary_ready(),
            PlayerEvent::PrimaryError(_, message) => self.on_primary_error(message),
            PlayerEvent::FallbackElapsed(_) => self.on_timeout(),
            PlayerEvent::SecondaryError(_, message) => self.on_secondary_error(message),
        }
    }

    fn on_primary_ready(&mut self) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading { primary } => {
                self.timer.cancel(self.round);
                tracing::info!("Playback {} ready on primary engine", self.round);
                self.phase = Phase::Ready {
                    engine: ActiveEngine::Primary(primary),
                };
            }
            // duplicate or late signal
            other => self.phase = other,
        }
    }

    fn on_primary_error(&mut self, message: String) {
        match self.phase {
            Phase::Loading { .. } => self.fall_back(message),
            // already Ready: no second fallback within a round
            Phase::Ready { .. } => {
                tracing::warn!("Primary error in ready round {}: {}", self.round, message)
            }
            _ => tracing::debug!("Ignoring primary error in round {}: {}", self.round, message),
        }
    }

    fn on_timeout(&mut self) {
        if matches!(self.phase, Phase::Loading { .. }) {
            self.fall_back(format!("no ready signal within {:?}", self.timeout));
        }
    }

    fn on_secondary_error(&mut self, message: String) {
        if matches!(
            self.phase,
            Phase::Ready {
                engine: ActiveEngine::Secondary(_),
            }
        ) {
            self.fail(message);
        }
    }

    fn fall_back(&mut self, cause: String) {
        let failure = GalleryError::PlaybackPrimaryFailure(cause);
        tracing::warn!("Playback {}: {}; switching to fallback engine", self.round, failure);

        self.timer.cancel(self.round);
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading { mut primary } => primary.destroy(),
            Phase::Ready { mut engine } => engine.destroy(),
            Phase::Idle | Phase::Failed { .. } => {}
        }

        let Some(source) = self.source.as_ref() else {
            return;
        };
        match self.factory.attach_secondary(self.round, source) {
            Ok(secondary) => {
                tracing::info!("Playback {} ready on fallback engine", self.round);
                self.phase = Phase::Ready {
                    engine: ActiveEngine::Secondary(secondary),
                };
            }
            Err(err) => self.fail(reason(err)),
        }
    }

    fn fail(&mut self, message: String) {
        let failure = GalleryError::PlaybackTerminalFailure(message);
        tracing::error!("Playback {}: {}", self.round, failure);

        self.timer.cancel(self.round);
        if let Phase::Ready { mut engine } = mem::replace(&mut self.phase, Phase::Idle) {
            engine.destroy();
        }
        self.phase = Phase::Failed {
            message: failure.to_string(),
        };
    }

    fn teardown(&mut self) {
        self.timer.cancel(self.round);
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading { mut primary } => primary.destroy(),
            Phase::Ready { mut engine } => engine.destroy(),
            Phase::Idle | Phase::Failed { .. } => {}
        }
    }
}

/// Bare failure text, without the playback variant prefix
fn reason(err: GalleryError) -> String {
    match err {
        GalleryError::PlaybackPrimaryFailure(message)
        | GalleryError::PlaybackTerminalFailure(message) => message,
        other => other.to_string(),
    }
}

impl<F: EngineFactory, T> Drop for PlaybackMachine<F, T> {
    fn drop(&mut self) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Loading { mut primary } => primary.destroy(),
            Phase::Ready { mut engine } => engine.destroy(),
            Phase::Idle | Phase::Failed { .. } => {}
        }
    }
}
