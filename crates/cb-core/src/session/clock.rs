//! Single-shot session countdown

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Fires its callback once after `window` unless cancelled first.
///
/// Cancellation is best-effort: once the countdown has elapsed and the
/// callback started, cancelling (or dropping the clock) does not stop it.
pub struct SessionClock {
    cancel_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl SessionClock {
    /// Start counting down; `on_fire` runs on its own task
    pub fn start<F>(window: Duration, on_fire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(window) => {
                    on_fire.await;
                }
                _ = cancel_rx => {
                    debug!("Session clock cancelled");
                }
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
            handle,
        }
    }

    /// Stop the countdown if it has not fired yet
    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Whether the clock task has completed (fired or cancelled)
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
