//! Shutdown drain.

use crate::broker::outcome::RelayError;
use crate::broker::table::{CorrelationTable, Resolution, Resolved};

/// Answer every pending request with `503` and close the table.
///
/// Safe to call on an empty or already drained table. Returns the number of
/// callers that were answered.
pub fn drain(table: &CorrelationTable) -> usize {
    let entries = table.drain_all();
    let total = entries.len();

    let answered = entries
        .into_iter()
        .map(|entry| entry.settle(Err(RelayError::ShuttingDown), Resolution::Shutdown))
        .filter(|resolved| *resolved == Resolved::Written)
        .count();

    if total > 0 {
        tracing::info!(drained = total, answered, "Drained pending requests");
    } else {
        tracing::debug!("No pending requests to drain");
    }
    answered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::handle::ResponseHandle;
    use crate::broker::id::CorrelationId;
    use crate::broker::table::CorrelationEntry;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drain_answers_503() {
        let table = Arc::new(CorrelationTable::new());
        let mut waiting = Vec::new();
        for _ in 0..3 {
            let id = CorrelationId::new();
            let (handle, pending) = ResponseHandle::channel();
            table
                .register(CorrelationEntry::new(id, handle), Duration::from_millis(50))
                .unwrap();
            waiting.push(pending);
        }

        assert_eq!(drain(&table), 3);
        assert!(table.is_empty());

        // Timers were cancelled: nothing turns into a 504 afterwards.
        tokio::time::sleep(Duration::from_millis(80)).await;
        for pending in waiting {
            assert!(matches!(pending.wait().await, Err(RelayError::ShuttingDown)));
        }
    }

    #[tokio::test]
    async fn test_drain_empty_table() {
        let table = CorrelationTable::new();
        assert_eq!(drain(&table), 0);
        assert_eq!(drain(&table), 0);
        assert!(table.is_closed());
    }
}
