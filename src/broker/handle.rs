//! Single-use response handles.
//!
//! A [`ResponseHandle`] is the obligation to send exactly one terminal outcome
//! back to a caller. The HTTP handler keeps the matching [`PendingResponse`]
//! and awaits it while the handle travels through the broker.

use tokio::sync::oneshot;

use crate::broker::outcome::{Outcome, RelayError};

/// Writer side of a caller's response. Can be written at most once.
#[derive(Debug)]
pub struct ResponseHandle {
    tx: Option<oneshot::Sender<Outcome>>,
}

/// Reader side of a caller's response.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<Outcome>,
}

impl ResponseHandle {
    /// Create a connected handle / pending-response pair.
    pub fn channel() -> (ResponseHandle, PendingResponse) {
        let (tx, rx) = oneshot::channel();
        (ResponseHandle { tx: Some(tx) }, PendingResponse { rx })
    }

    /// Whether an outcome has already been written.
    pub fn is_used(&self) -> bool {
        self.tx.is_none()
    }

    /// Write the terminal outcome.
    ///
    /// Returns `false` without writing if the handle was already used. A
    /// caller that has gone away still counts as a successful write: the
    /// obligation is discharged either way.
    pub fn resolve(&mut self, outcome: Outcome) -> bool {
        match self.tx.take() {
            Some(tx) => {
                if tx.send(outcome).is_err() {
                    tracing::debug!("Caller disconnected before its outcome was written");
                }
                true
            }
            None => {
                tracing::warn!("Response handle already used, dropping second outcome");
                false
            }
        }
    }
}

impl PendingResponse {
    /// Wait for the outcome.
    ///
    /// A handle dropped without being written means its broker went away,
    /// which the caller sees as the service shutting down.
    pub async fn wait(self) -> Outcome {
        self.rx.await.unwrap_or(Err(RelayError::ShuttingDown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_write_wins() {
        let (mut handle, pending) = ResponseHandle::channel();
        assert!(!handle.is_used());

        assert!(handle.resolve(Ok(json!("first"))));
        assert!(handle.is_used());
        assert!(!handle.resolve(Ok(json!("second"))));

        assert_eq!(pending.wait().await.unwrap(), json!("first"));
    }

    #[tokio::test]
    async fn test_dropped_handle_reads_as_shutdown() {
        let (handle, pending) = ResponseHandle::channel();
        drop(handle);
        assert!(matches!(pending.wait().await, Err(RelayError::ShuttingDown)));
    }

    #[tokio::test]
    async fn test_write_after_caller_left_is_not_an_error() {
        let (mut handle, pending) = ResponseHandle::channel();
        drop(pending);
        assert!(handle.resolve(Ok(json!(null))));
    }
}
