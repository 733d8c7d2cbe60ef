//! Engines that hand the media to software outside this process
//!
//! - Primary: an external player process (mpv by default). Readiness is read
//!   from its terminal output, an early failing exit is an error signal.
//! - Secondary: the OS default handler for the URL. Always available, no
//!   readiness signal; a launch failure is terminal.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use super::engine::{EngineFactory, MediaSource, PlaybackEngine, PlayerEvent, Round};
use crate::error::{GalleryError, Result};

/// Printed by the player once playback has started
const READY_MARKER: &str = "media-gallery:ready";

/// Creates player processes and system-handler launches
#[derive(Debug, Clone)]
pub struct ExternalEngines {
    runtime: Handle,
    events: UnboundedSender<PlayerEvent>,
    player_command: String,
}

impl ExternalEngines {
    pub fn new(runtime: Handle, events: UnboundedSender<PlayerEvent>, player_command: &str) -> Self {
        Self {
            runtime,
            events,
            player_command: player_command.to_string(),
        }
    }

    fn command(&self, source: &MediaSource) -> Result<Command> {
        let mut parts = self.player_command.split_whitespace();
        let program = parts.next().ok_or_else(|| {
            GalleryError::PlaybackPrimaryFailure("no player command configured".to_string())
        })?;

        let mut command = Command::new(program);
        command
            .args(parts)
            .arg("--quiet")
            .arg(format!("--term-playing-msg={}", READY_MARKER))
            .arg(format!("--title={}", source.target))
            .arg(&source.media_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        Ok(command)
    }
}

impl EngineFactory for ExternalEngines {
    type Primary = PlayerProcess;
    type Secondary = SystemPlayer;

    fn start_primary(&mut self, round: Round, source: &MediaSource) -> Result<PlayerProcess> {
        let mut command = self.command(source)?;

        let child = {
            let _guard = self.runtime.enter();
            command.spawn().map_err(|err| {
                GalleryError::PlaybackPrimaryFailure(format!(
                    "failed to launch {}: {}",
                    self.player_command, err
                ))
            })?
        };

        let (kill_tx, kill_rx) = oneshot::channel();
        self.runtime
            .spawn(monitor(child, round, self.events.clone(), kill_rx));

        tracing::debug!("Player process started for round {}", round);
        Ok(PlayerProcess {
            round,
            kill: Some(kill_tx),
        })
    }

    fn attach_secondary(&mut self, round: Round, source: &MediaSource) -> Result<SystemPlayer> {
        open::that_detached(&source.media_url).map_err(|err| {
            GalleryError::PlaybackTerminalFailure(format!("could not open system player: {}", err))
        })?;
        tracing::debug!("Handed round {} to the system player", round);
        Ok(SystemPlayer { round })
    }
}

/// Running external player. Dropping or destroying it kills the process.
#[derive(Debug)]
pub struct PlayerProcess {
    round: Round,
    kill: Option<oneshot::Sender<()>>,
}

impl PlaybackEngine for PlayerProcess {
    fn destroy(&mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
            tracing::debug!("Player process for round {} destroyed", self.round);
        }
    }
}

/// Launch of the OS default handler
#[derive(Debug)]
pub struct SystemPlayer {
    round: Round,
}

impl PlaybackEngine for SystemPlayer {
    fn destroy(&mut self) {
        // the OS player runs independently and has nothing to release here
        tracing::debug!("System player for round {} released", self.round);
    }
}

/// Watch the player's output for the ready marker and its exit status
async fn monitor(
    mut child: Child,
    round: Round,
    events: UnboundedSender<PlayerEvent>,
    mut kill: oneshot::Receiver<()>,
) {
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        let mut ready = false;
        loop {
            tokio::select! {
                _ = &mut kill => {
                    let _ = child.kill().await;
                    return;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !ready && line.contains(READY_MARKER) {
                            ready = true;
                            let _ = events.send(PlayerEvent::PrimaryReady(round));
                        }
                    }
                    Ok(None) | Err(_) => break,
                },
            }
        }
    }

    tokio::select! {
        _ = &mut kill => {
            let _ = child.kill().await;
        }
        status = child.wait() => match status {
            Ok(status) if status.success() => {
                tracing::debug!("Player for round {} exited", round);
            }
            Ok(status) => {
                let _ = events.send(PlayerEvent::PrimaryError(
                    round,
                    format!("player exited with {}", status),
                ));
            }
            Err(err) => {
                let _ = events.send(PlayerEvent::PrimaryError(round, err.to_string()));
            }
        },
    }
}
