//! Graceful shutdown on SIGTERM / SIGINT (Ctrl+C on Windows).
//!
//! [`Shutdown`] owns a [`CancellationToken`] triggered by the first OS signal
//! and a [`TaskTracker`] for background tasks (the expiry sweep) that must
//! finish before the process exits.

use std::future::Future;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Signal-driven shutdown coordinator.
#[derive(Debug)]
pub struct Shutdown {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl Shutdown {
    /// Installs the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)] // Result needed on Unix for signal registration
    pub fn try_new() -> Result<Self, std::io::Error> {
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        let trigger = token.clone();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            tracker.spawn(async move {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
                    () = trigger.cancelled() => return,
                }
                trigger.cancel();
            });
        }

        #[cfg(windows)]
        {
            tracker.spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl-C, shutting down"),
                    () = trigger.cancelled() => return,
                }
                trigger.cancel();
            });
        }

        Ok(Self { tracker, token })
    }

    /// Token cancelled when shutdown starts.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Runs `task` until completion; shutdown waits for it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Starts shutdown (if not yet started) and waits for tracked tasks.
    pub async fn finish(self) {
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_finish_waits_for_tracked_tasks() {
        let shutdown = Shutdown::try_new().unwrap();
        let done = Arc::new(AtomicBool::new(false));
        let token = shutdown.token();
        let flag = Arc::clone(&done);
        shutdown.spawn(async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        shutdown.finish().await;
        assert!(done.load(Ordering::SeqCst));
    }
}
