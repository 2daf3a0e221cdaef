//! Shared stop signal for coordinating worker-task shutdown.
//!
//! A send phase runs a sender task and an ACK-listener task against one
//! link. [`ShutdownToken`] bundles the `watch` channel they poll for the
//! stop signal with storage for their join handles, so the owner can stop
//! and await both with two calls.

use tokio::sync::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A cancellation token plus the handles of the tasks it governs.
pub struct ShutdownToken {
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            stop_tx,
            stop_rx,
            task_handles: Mutex::new(Vec::new()),
        }
    }

    /// A new subscription to the stop signal. Each worker task holds its
    /// own receiver and checks it between loop iterations.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    /// Whether the stop signal has been sent.
    pub fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Register a worker task handle to await on shutdown.
    pub async fn add_task(&self, handle: JoinHandle<()>) {
        self.task_handles.lock().await.push(handle);
    }

    /// Send the stop signal to all subscribers. Idempotent.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Await all registered tasks, draining the handle list. Join errors
    /// (panics, cancellations) are ignored.
    pub async fn join_all(&self) {
        let handles: Vec<JoinHandle<()>> = self.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}
