use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Cancellable 1 Hz tick source for an active attempt.
///
/// The driving layer owns the timer, receives ticks on the returned channel,
/// and applies each one to the session via `ExamSession::tick`. The
/// background task is aborted on [`stop`] and on drop, so no callback can
/// outlive the attempt and touch a discarded session.
///
/// [`stop`]: SessionTimer::stop
#[derive(Debug)]
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Starts ticking once per second. The first tick arrives after a full
    /// second, not immediately.
    #[must_use]
    pub fn start() -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    // Receiver gone: the attempt was torn down.
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    /// Stops the timer deterministically. Safe to call more than once via
    /// drop; a stopped timer never delivers another tick.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
