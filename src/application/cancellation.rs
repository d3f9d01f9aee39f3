//! Cooperative cancellation for one query.
//!
//! The orchestrator checks the token before planning, before every tool
//! call and before evaluation and synthesis. In-flight service calls are
//! also raced against it.

use std::sync::Arc;
use tokio::sync::watch;

/// Sending side; cancel from any task.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already; nothing to do then.
        let _ = self.tx.send(true);
    }
}

/// Receiving side, checked by the orchestrator.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// A connected handle/token pair.
    pub fn new() -> (CancellationHandle, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx: Arc::new(tx) }, CancellationToken { rx })
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_, token) = Self::new();
        token
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::never()
    }
}
