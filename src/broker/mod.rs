//! Pending-request correlation broker.
//!
//! # Data Flow
//! ```text
//! POST /prompt
//!     → intake.rs   (validate, pick session, new CorrelationId)
//!     → table.rs    (park ResponseHandle, arm TimeoutGuard)
//!     → engine      (fire-and-forget PromptJob)
//!
//! exactly one of:
//!     sink.rs   complete(id, outcome)   → 200 / 500
//!     guard.rs  deadline passed         → 504
//!     drain.rs  listener closing        → 503
//!         → table.rs resolve (remove, cancel timer, write once)
//! ```
//!
//! # Design Decisions
//! - Removal from the table is the only way to reach a parked handle, so the
//!   first resolver wins and later ones find nothing.
//! - One table per listener generation; a drained table stays closed.
//! - The broker never awaits the engine.

pub mod drain;
pub mod guard;
pub mod handle;
pub mod id;
pub mod intake;
pub mod outcome;
pub mod sink;
pub mod table;

use std::sync::Arc;
use std::time::Duration;

use crate::session::PromptEngine;

pub use handle::{PendingResponse, ResponseHandle};
pub use id::CorrelationId;
pub use intake::{PromptRequest, RequestIntake};
pub use outcome::{outcome_response, Outcome, RelayError};
pub use sink::CompletionSink;
pub use table::{CorrelationTable, Resolution, Resolved};

/// One generation of the broker: a table and the components bound to it.
#[derive(Clone)]
pub struct Broker {
    table: Arc<CorrelationTable>,
    intake: RequestIntake,
}

impl Broker {
    pub fn new(engine: Arc<dyn PromptEngine>, timeout: Duration) -> Self {
        let table = Arc::new(CorrelationTable::new());
        let intake = RequestIntake::new(table.clone(), engine, timeout);
        Self { table, intake }
    }

    pub fn intake(&self) -> &RequestIntake {
        &self.intake
    }

    pub fn sink(&self) -> CompletionSink {
        CompletionSink::new(self.table.clone())
    }

    pub fn table(&self) -> &Arc<CorrelationTable> {
        &self.table
    }

    /// Number of requests still waiting for an outcome.
    pub fn pending(&self) -> usize {
        self.table.len()
    }

    /// Answer everything still pending with `503` and close this generation.
    pub fn drain(&self) -> usize {
        drain::drain(&self.table)
    }
}
