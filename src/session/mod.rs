//! Session engine boundary.
//!
//! # Data Flow
//! ```text
//! RequestIntake
//!     → PromptEngine::resolve_target (is anyone listening?)
//!     → PromptEngine::dispatch(PromptJob)      accepted / rejected, nothing more
//!     ... engine works on its own schedule ...
//!     → PromptJob::complete → CompletionSink
//! ```
//!
//! The broker never awaits the engine. An accepted job promises exactly one
//! later call to the completion sink; calls after the request was settled by
//! a timeout or a drain are ignored by the sink.

pub mod local;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::broker::id::CorrelationId;
use crate::broker::outcome::Outcome;
use crate::broker::sink::CompletionSink;

pub use local::LocalEngine;

/// Identifies a conversation inside an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a prompt will be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTarget {
    /// Append to an existing conversation.
    Conversation(ConversationId),
    /// Start a new task with the prompt as its first message.
    NewTask,
}

/// A prompt handed to an engine together with the way back.
#[derive(Debug, Clone)]
pub struct PromptJob {
    pub id: CorrelationId,
    pub target: SessionTarget,
    pub prompt: String,
    pub completion: CompletionSink,
}

impl PromptJob {
    /// Report the final outcome for this job.
    pub fn complete(&self, outcome: Outcome) {
        self.completion.complete(self.id, outcome);
    }
}

/// Synchronous refusal of a job at dispatch time.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("engine queue is full")]
    QueueFull,

    #[error("engine has stopped")]
    Stopped,

    #[error("engine rejected prompt: {0}")]
    Rejected(String),
}

/// The asynchronous subsystem that produces answers.
pub trait PromptEngine: Send + Sync + 'static {
    /// Pick the target for a prompt, or `None` if no session is active.
    fn resolve_target(&self, continue_conversation: bool) -> Option<SessionTarget>;

    /// Hand a job to the engine. `Ok` only acknowledges acceptance.
    fn dispatch(&self, job: PromptJob) -> Result<(), DispatchError>;
}
