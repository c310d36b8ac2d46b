//! Process-wide stop signal.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable stop flag. Once triggered it stays triggered.
///
/// Observed by the dispatcher's admission loop, the scheduler, and the
/// admin server's graceful shutdown.
#[derive(Clone, Debug)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called, immediately if it already was.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            // The sender lives as long as `self`, so this is unreachable.
            std::future::pending::<()>().await;
        }
    }
}
