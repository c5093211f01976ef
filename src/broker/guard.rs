//! Per-entry timeout guard.
//!
//! Each registered entry owns one guard. On expiry the guard resolves its
//! entry with a gateway timeout through the same path every other resolver
//! uses, so an entry that was already settled is simply not found.

use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::broker::id::CorrelationId;
use crate::broker::outcome::RelayError;
use crate::broker::table::{CorrelationTable, Resolution, Resolved};

/// A one-shot timer bound to a single correlation id.
///
/// Dropping the guard cancels the timer, so removing an entry from the table
/// can never leave a live timer behind.
#[derive(Debug)]
pub struct TimeoutGuard {
    task: JoinHandle<()>,
}

impl TimeoutGuard {
    /// Arm a timer that resolves `id` in `table` after `after` has elapsed.
    ///
    /// Entries are armed by [`CorrelationTable::register`] while the entry is
    /// inserted. Must be called from within a Tokio runtime.
    pub fn arm(table: Weak<CorrelationTable>, id: CorrelationId, after: Duration) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;

            let Some(table) = table.upgrade() else {
                tracing::debug!(correlation_id = %id, "Timer fired after its table was dropped");
                return;
            };

            let resolved = table.resolve(id, Err(RelayError::TimedOut(after)), Resolution::Timeout);
            if resolved == Resolved::Written {
                tracing::warn!(
                    correlation_id = %id,
                    timeout_ms = after.as_millis() as u64,
                    "No completion before deadline"
                );
            }
        });

        Self { task }
    }

    /// Cancel the timer. A timer that already fired is unaffected.
    pub fn cancel(self) {
        drop(self);
    }

    /// Whether the timer has neither fired nor been cancelled.
    pub fn is_armed(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        // When the timer task itself is the resolver this is a no-op: it has
        // no await point left.
        self.task.abort();
    }
}
