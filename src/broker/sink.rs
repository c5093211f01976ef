//! Completion sink: where engines deliver final outcomes.

use serde_json::Value;
use std::sync::Arc;

use crate::broker::id::CorrelationId;
use crate::broker::outcome::{Outcome, RelayError};
use crate::broker::table::{CorrelationTable, Resolution, Resolved};

/// Entry point for out-of-band completions.
///
/// Cheap to clone; every dispatched job carries one. Safe to call any number
/// of times per id and from any task. Only the first call for a live id has
/// an effect.
#[derive(Debug, Clone)]
pub struct CompletionSink {
    table: Arc<CorrelationTable>,
}

impl CompletionSink {
    pub fn new(table: Arc<CorrelationTable>) -> Self {
        Self { table }
    }

    /// Deliver the outcome for `id`.
    ///
    /// An unknown id is the expected result of losing a race with the
    /// timeout or the shutdown drain. It is logged and otherwise ignored.
    pub fn complete(&self, id: CorrelationId, outcome: Outcome) -> Resolved {
        let resolved = self.table.resolve(id, outcome, Resolution::Completion);
        if resolved == Resolved::NotFound {
            tracing::warn!(correlation_id = %id, "Completion for unknown or already-resolved id");
        }
        resolved
    }

    /// Wire-level form of [`complete`](Self::complete):
    /// `(requestId, success, data)`.
    pub fn complete_raw(&self, request_id: &str, success: bool, data: Value) -> Resolved {
        let id = match request_id.parse::<CorrelationId>() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Completion with malformed id");
                return Resolved::NotFound;
            }
        };

        let outcome = if success {
            Ok(data)
        } else {
            Err(RelayError::SubsystemFailure { details: data })
        };
        self.complete(id, outcome)
    }
}
