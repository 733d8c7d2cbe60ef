/// Playback bootstrap module
///
/// This module brings a selected record into a playable state:
/// - Engine, timer and event contracts (engine.rs)
/// - The primary/fallback state machine (machine.rs)
/// - Fallback timer on tokio (timer.rs)
/// - External player process and system handler engines (external.rs)

pub mod engine;
pub mod external;
pub mod machine;
pub mod timer;

pub use engine::{EngineFactory, FallbackTimer, MediaSource, PlaybackEngine, PlayerEvent, Round};
pub use external::ExternalEngines;
pub use machine::{EngineKind, PlaybackMachine, PlaybackStatus};
pub use timer::TokioFallbackTimer;
