use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::engine::{FallbackTimer, PlayerEvent, Round};

/// Fallback timer backed by one tokio sleep task per round.
/// Cancelling aborts the task, so a cancelled round can never deliver.
#[derive(Debug)]
pub struct TokioFallbackTimer {
    runtime: Handle,
    events: UnboundedSender<PlayerEvent>,
    pending: HashMap<Round, JoinHandle<()>>,
}

impl TokioFallbackTimer {
    pub fn new(runtime: Handle, events: UnboundedSender<PlayerEvent>) -> Self {
        Self {
            runtime,
            events,
            pending: HashMap::new(),
        }
    }
}

impl FallbackTimer for TokioFallbackTimer {
    fn arm(&mut self, round: Round, after: Duration) {
        self.cancel(round);
        self.pending.retain(|_, task| !task.is_finished());

        let events = self.events.clone();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            // receiver gone means the app is shutting down
            let _ = events.send(PlayerEvent::FallbackElapsed(round));
        });
        self.pending.insert(round, task);
    }

    fn cancel(&mut self, round: Round) {
        if let Some(task) = self.pending.remove(&round) {
            task.abort();
        }
    }
}

impl Drop for TokioFallbackTimer {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_timer_delivers_round() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioFallbackTimer::new(Handle::current(), tx);
        let round = Round::default().next();

        timer.arm(round, Duration::from_secs(4));
        assert_eq!(rx.recv().await, Some(PlayerEvent::FallbackElapsed(round)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioFallbackTimer::new(Handle::current(), tx);
        let first = Round::default().next();
        let second = first.next();

        timer.arm(first, Duration::from_secs(4));
        timer.cancel(first);
        timer.arm(second, Duration::from_secs(8));

        assert_eq!(rx.recv().await, Some(PlayerEvent::FallbackElapsed(second)));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
