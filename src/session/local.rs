//! In-process conversation engine.
//!
//! A bounded queue feeds a single worker task. The worker appends each prompt
//! to its conversation, asks the responder for a reply and reports the
//! outcome through the job's completion sink.

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::broker::outcome::Outcome;
use crate::config::EngineConfig;
use crate::session::{ConversationId, DispatchError, PromptEngine, PromptJob, SessionTarget};

/// Produces the reply for the latest user turn of a conversation.
pub type Responder = Arc<dyn Fn(&Conversation) -> Outcome + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Message history of one task.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub turns: Vec<Turn>,
}

impl Conversation {
    fn new(id: ConversationId) -> Self {
        Self {
            id,
            turns: Vec::new(),
        }
    }

    fn push(&mut self, role: Role, text: String) {
        self.turns.push(Turn { role, text });
    }

    /// Text of the most recent user turn.
    pub fn last_prompt(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.text.as_str())
    }
}

fn echo(conversation: &Conversation) -> Outcome {
    let prompt = conversation.last_prompt().unwrap_or_default();
    Ok(Value::String(format!("Received: {}", prompt)))
}

/// Engine that answers prompts inside this process.
pub struct LocalEngine {
    queue: mpsc::Sender<(ConversationId, PromptJob)>,
    attached: AtomicBool,
    current: Mutex<Option<ConversationId>>,
    conversations: Arc<DashMap<ConversationId, Conversation>>,
}

impl LocalEngine {
    /// Start an engine that echoes prompts back.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: &EngineConfig) -> Self {
        Self::with_responder(config, Arc::new(echo))
    }

    /// Start an engine with a custom responder.
    pub fn with_responder(config: &EngineConfig, responder: Responder) -> Self {
        let (queue, rx) = mpsc::channel(config.queue_capacity.max(1));
        let conversations = Arc::new(DashMap::new());

        tokio::spawn(run_worker(
            rx,
            conversations.clone(),
            responder,
            Duration::from_millis(config.reply_delay_ms),
        ));

        tracing::info!(
            queue_capacity = config.queue_capacity,
            attached = config.attached,
            "Local engine started"
        );

        Self {
            queue,
            attached: AtomicBool::new(config.attached),
            current: Mutex::new(None),
            conversations,
        }
    }

    pub fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    /// Stop accepting prompts; `resolve_target` returns `None` until reattached.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn current_conversation(&self) -> Option<ConversationId> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<Conversation> {
        self.conversations.get(id).map(|r| r.value().clone())
    }

    /// Number of conversations held in memory.
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

impl PromptEngine for LocalEngine {
    fn resolve_target(&self, continue_conversation: bool) -> Option<SessionTarget> {
        if !self.is_attached() {
            return None;
        }
        match self.current_conversation() {
            Some(id) if continue_conversation => Some(SessionTarget::Conversation(id)),
            _ => Some(SessionTarget::NewTask),
        }
    }

    fn dispatch(&self, job: PromptJob) -> Result<(), DispatchError> {
        let permit = self.queue.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => DispatchError::QueueFull,
            TrySendError::Closed(()) => DispatchError::Stopped,
        })?;

        let conversation_id = match job.target {
            SessionTarget::Conversation(id) => id,
            SessionTarget::NewTask => {
                let id = ConversationId::new();
                self.conversations.insert(id, Conversation::new(id));
                let previous = self
                    .current
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .replace(id);
                // Only the current conversation can be continued.
                if let Some(previous) = previous {
                    self.conversations.remove(&previous);
                }
                tracing::debug!(conversation_id = %id, "Started new task");
                id
            }
        };

        permit.send((conversation_id, job));
        Ok(())
    }
}

fn respond(responder: &Responder, conversation: &mut Conversation, prompt: &str) -> Outcome {
    conversation.push(Role::User, prompt.to_string());
    let outcome = responder(&*conversation);
    if let Ok(reply) = &outcome {
        let text = match reply {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        conversation.push(Role::Assistant, text);
    }
    outcome
}

async fn run_worker(
    mut rx: mpsc::Receiver<(ConversationId, PromptJob)>,
    conversations: Arc<DashMap<ConversationId, Conversation>>,
    responder: Responder,
    reply_delay: Duration,
) {
    while let Some((conversation_id, job)) = rx.recv().await {
        if !reply_delay.is_zero() {
            tokio::time::sleep(reply_delay).await;
        }

        let outcome = match conversations.get_mut(&conversation_id) {
            Some(mut conversation) => respond(&responder, conversation.value_mut(), &job.prompt),
            None => {
                // Superseded by a newer task while queued: answer without keeping history.
                let mut detached = Conversation::new(conversation_id);
                respond(&responder, &mut detached, &job.prompt)
            }
        };

        tracing::debug!(
            correlation_id = %job.id,
            conversation_id = %conversation_id,
            success = outcome.is_ok(),
            "Engine finished prompt"
        );
        job.complete(outcome);
    }

    tracing::debug!("Local engine worker stopped");
}
