//! Correlation table: pending requests keyed by correlation id.
//!
//! # Invariants
//! - At most one entry per id.
//! - Removing an entry is the only way to obtain its response handle, so
//!   whichever resolver removes it first is the only one that can write.
//! - An entry's timer lives exactly as long as the entry.
//! - Once drained the table is closed and refuses new registrations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::broker::guard::TimeoutGuard;
use crate::broker::handle::ResponseHandle;
use crate::broker::id::CorrelationId;
use crate::broker::outcome::{Outcome, RelayError};
use crate::observability::metrics;

/// Which path resolved an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The engine delivered an outcome.
    Completion,
    /// The deadline passed.
    Timeout,
    /// The listener closed and drained the table.
    Shutdown,
    /// The engine rejected the prompt at submission.
    InitiationFailure,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Completion => "completion",
            Resolution::Timeout => "timeout",
            Resolution::Shutdown => "shutdown",
            Resolution::InitiationFailure => "initiation_failure",
        }
    }
}

/// Result of trying to resolve an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// The outcome was written to the caller.
    Written,
    /// The entry existed but its handle had already been written.
    HandleAlreadyUsed,
    /// No entry with that id (never registered or already resolved).
    NotFound,
}

/// A parked request.
#[derive(Debug)]
pub struct CorrelationEntry {
    id: CorrelationId,
    handle: ResponseHandle,
    timer: Option<TimeoutGuard>,
    created_at: Instant,
}

impl CorrelationEntry {
    /// A parked request with no timer yet. The table arms it on registration.
    pub fn new(id: CorrelationId, handle: ResponseHandle) -> Self {
        Self {
            id,
            handle,
            timer: None,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(TimeoutGuard::is_armed)
    }

    /// Terminal transition: cancel the timer and write the outcome once.
    ///
    /// Consumes the entry, so a settled entry cannot be settled again.
    pub fn settle(mut self, outcome: Outcome, path: Resolution) -> Resolved {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }

        let elapsed = self.created_at.elapsed();
        if self.handle.is_used() {
            tracing::warn!(
                correlation_id = %self.id,
                path = path.as_str(),
                "Response already written, skipping"
            );
            return Resolved::HandleAlreadyUsed;
        }

        let status = match &outcome {
            Ok(_) => 200,
            Err(e) => e.status().as_u16(),
        };
        self.handle.resolve(outcome);
        metrics::record_resolution(path.as_str(), elapsed);

        tracing::info!(
            correlation_id = %self.id,
            path = path.as_str(),
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request resolved"
        );
        Resolved::Written
    }
}

/// Read-only view of a pending entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo {
    pub id: CorrelationId,
    pub created_at: Instant,
    pub armed: bool,
}

/// A registration the table refused, handed back so the caller can still
/// answer its response handle.
#[derive(Debug)]
pub struct Rejected {
    pub error: RelayError,
    pub entry: CorrelationEntry,
}

#[derive(Debug, Default)]
struct TableState {
    entries: HashMap<CorrelationId, CorrelationEntry>,
    closed: bool,
}

/// Store of pending requests for one listener generation.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    state: Mutex<TableState>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TableState> {
        // No code panics while holding the lock; recover rather than poison
        // every later request.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Park an entry under its id and arm its deadline.
    ///
    /// The timer is armed while the lock is held, so it cannot look for the
    /// entry before the entry is in the table. Fails with
    /// [`RelayError::DuplicateId`] if the id is live, or
    /// [`RelayError::ShuttingDown`] once the table has been drained. A
    /// rejected entry is returned unarmed.
    pub fn register(self: &Arc<Self>, mut entry: CorrelationEntry, timeout: Duration) -> Result<(), Rejected> {
        let mut state = self.state();
        if state.closed {
            return Err(Rejected {
                error: RelayError::ShuttingDown,
                entry,
            });
        }
        if state.entries.contains_key(&entry.id) {
            return Err(Rejected {
                error: RelayError::DuplicateId(entry.id),
                entry,
            });
        }

        let id = entry.id;
        entry.timer = Some(TimeoutGuard::arm(Arc::downgrade(self), id, timeout));
        state.entries.insert(id, entry);
        metrics::record_pending(state.entries.len());
        drop(state);

        tracing::debug!(correlation_id = %id, "Registered pending request");
        Ok(())
    }

    /// Look up an entry without touching it.
    pub fn lookup(&self, id: &CorrelationId) -> Option<EntryInfo> {
        self.state().entries.get(id).map(|entry| EntryInfo {
            id: entry.id,
            created_at: entry.created_at,
            armed: entry.is_armed(),
        })
    }

    /// Remove an entry. Removing an absent id is a no-op.
    pub fn remove(&self, id: &CorrelationId) -> Option<CorrelationEntry> {
        let mut state = self.state();
        let entry = state.entries.remove(id);
        if entry.is_some() {
            metrics::record_pending(state.entries.len());
        }
        entry
    }

    /// Take every entry and close the table to further registrations.
    pub fn drain_all(&self) -> Vec<CorrelationEntry> {
        let mut state = self.state();
        state.closed = true;
        let entries: Vec<_> = state.entries.drain().map(|(_, entry)| entry).collect();
        metrics::record_pending(0);
        entries
    }

    /// Remove `id` and settle it with `outcome`.
    ///
    /// This is the one resolution function every path goes through. The
    /// entry is removed under the lock and settled outside it.
    pub fn resolve(&self, id: CorrelationId, outcome: Outcome, path: Resolution) -> Resolved {
        match self.remove(&id) {
            Some(entry) => entry.settle(outcome, path),
            None => {
                tracing::debug!(
                    correlation_id = %id,
                    path = path.as_str(),
                    "Nothing to resolve"
                );
                Resolved::NotFound
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Age of the longest-waiting entry.
    pub fn oldest_age(&self) -> Option<Duration> {
        self.state()
            .entries
            .values()
            .map(|entry| entry.created_at)
            .min()
            .map(|created_at| created_at.elapsed())
    }
}
