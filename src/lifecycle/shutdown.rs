//! Shutdown coordination.

use std::future::Future;
use tokio::sync::broadcast;

/// Broadcast trigger that tells a serving listener to stop accepting.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Future that completes once [`trigger`](Self::trigger) is called or
    /// every `Shutdown` handle is dropped.
    ///
    /// Subscribes immediately, so a trigger that happens before the future
    /// is first polled is not missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
