//! Request intake: validate, park, arm, dispatch.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::broker::handle::ResponseHandle;
use crate::broker::id::CorrelationId;
use crate::broker::outcome::RelayError;
use crate::broker::sink::CompletionSink;
use crate::broker::table::{CorrelationEntry, CorrelationTable, Rejected, Resolution, Resolved};
use crate::observability::metrics;
use crate::session::{PromptEngine, PromptJob};

/// A validated `POST /prompt` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub prompt: String,
    pub continue_conversation: bool,
}

impl PromptRequest {
    /// Validate a raw JSON body.
    ///
    /// `prompt` must be a non-empty string. `continueConversation` counts
    /// only when it is literally `true`.
    pub fn from_json(body: &Value) -> Result<Self, RelayError> {
        let prompt = match body.get("prompt") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(RelayError::Validation(
                    "\"prompt\" field is required and must be a string.".to_string(),
                ))
            }
        };

        let continue_conversation = matches!(body.get("continueConversation"), Some(Value::Bool(true)));

        Ok(Self {
            prompt,
            continue_conversation,
        })
    }
}

/// Accepts new prompts and parks them until an outcome arrives.
#[derive(Clone)]
pub struct RequestIntake {
    table: Arc<CorrelationTable>,
    engine: Arc<dyn PromptEngine>,
    timeout: Duration,
}

impl RequestIntake {
    pub fn new(table: Arc<CorrelationTable>, engine: Arc<dyn PromptEngine>, timeout: Duration) -> Self {
        Self {
            table,
            engine,
            timeout,
        }
    }

    /// Submit a prompt on behalf of the caller owning `handle`.
    ///
    /// Returns the correlation id once the request was parked, including when
    /// the engine then refused it. `None` means it was never registered; the
    /// handle has already been written in that case.
    pub fn submit(&self, body: &Value, mut handle: ResponseHandle) -> Option<CorrelationId> {
        let request = match PromptRequest::from_json(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected prompt");
                metrics::record_prompt("invalid");
                handle.resolve(Err(e));
                return None;
            }
        };

        let Some(target) = self.engine.resolve_target(request.continue_conversation) else {
            tracing::warn!("No active session to receive prompt");
            metrics::record_prompt("no_session");
            handle.resolve(Err(RelayError::Unavailable(
                "Active session not found.".to_string(),
            )));
            return None;
        };

        let id = CorrelationId::new();
        if let Err(Rejected { error, entry }) = self
            .table
            .register(CorrelationEntry::new(id, handle), self.timeout)
        {
            if let RelayError::DuplicateId(_) = error {
                tracing::error!(correlation_id = %id, "Duplicate correlation id generated");
            }
            metrics::record_prompt(error.kind());
            entry.settle(Err(error), Resolution::InitiationFailure);
            return None;
        }

        tracing::info!(
            correlation_id = %id,
            target = ?target,
            continue_conversation = request.continue_conversation,
            timeout_ms = self.timeout.as_millis() as u64,
            "Prompt parked"
        );

        let job = PromptJob {
            id,
            target,
            prompt: request.prompt,
            completion: CompletionSink::new(self.table.clone()),
        };

        if let Err(e) = self.engine.dispatch(job) {
            tracing::error!(correlation_id = %id, error = %e, "Engine rejected prompt");
            metrics::record_prompt("dispatch_failed");
            let resolved = self.table.resolve(
                id,
                Err(RelayError::Dispatch(e.to_string())),
                Resolution::InitiationFailure,
            );
            if resolved == Resolved::NotFound {
                // A drain got there first and already answered the caller.
                tracing::debug!(correlation_id = %id, "Entry gone before dispatch failure was reported");
            }
            return Some(id);
        }

        metrics::record_prompt("parked");
        Some(id)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DispatchError, SessionTarget};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubEngine {
        attached: bool,
        reject: bool,
        jobs: Mutex<Vec<PromptJob>>,
    }

    impl PromptEngine for StubEngine {
        fn resolve_target(&self, _continue_conversation: bool) -> Option<SessionTarget> {
            self.attached.then_some(SessionTarget::NewTask)
        }

        fn dispatch(&self, job: PromptJob) -> Result<(), DispatchError> {
            if self.reject {
                return Err(DispatchError::Rejected("busy".into()));
            }
            self.jobs.lock().unwrap().push(job);
            Ok(())
        }
    }

    fn intake(engine: StubEngine, timeout: Duration) -> (RequestIntake, Arc<CorrelationTable>, Arc<StubEngine>) {
        let table = Arc::new(CorrelationTable::new());
        let engine = Arc::new(engine);
        let intake = RequestIntake::new(table.clone(), engine.clone(), timeout);
        (intake, table, engine)
    }

    #[test]
    fn test_prompt_validation() {
        assert!(PromptRequest::from_json(&json!({})).is_err());
        assert!(PromptRequest::from_json(&json!({ "prompt": "" })).is_err());
        assert!(PromptRequest::from_json(&json!({ "prompt": 42 })).is_err());
        assert!(PromptRequest::from_json(&json!("hi")).is_err());

        let req = PromptRequest::from_json(&json!({ "prompt": "hi" })).unwrap();
        assert_eq!(req.prompt, "hi");
        assert!(!req.continue_conversation);

        let req = PromptRequest::from_json(&json!({ "prompt": "hi", "continueConversation": "true" })).unwrap();
        assert!(!req.continue_conversation);

        let req = PromptRequest::from_json(&json!({ "prompt": "hi", "continueConversation": true })).unwrap();
        assert!(req.continue_conversation);
    }

    #[tokio::test]
    async fn test_invalid_body_answers_400_without_registering() {
        let (intake, table, _engine) = intake(
            StubEngine { attached: true, ..Default::default() },
            Duration::from_secs(60),
        );
        let (handle, pending) = ResponseHandle::channel();

        assert!(intake.submit(&json!({ "continueConversation": true }), handle).is_none());
        let err = pending.wait().await.unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_no_session_answers_404() {
        let (intake, table, _engine) = intake(StubEngine::default(), Duration::from_secs(60));
        let (handle, pending) = ResponseHandle::channel();

        assert!(intake.submit(&json!({ "prompt": "hi" }), handle).is_none());
        assert_eq!(pending.wait().await.unwrap_err().status().as_u16(), 404);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_parks_and_dispatches() {
        let (intake, table, engine) = intake(
            StubEngine { attached: true, ..Default::default() },
            Duration::from_secs(60),
        );
        let (handle, pending) = ResponseHandle::channel();

        let id = intake.submit(&json!({ "prompt": "hi" }), handle).unwrap();
        assert!(table.lookup(&id).unwrap().armed);

        let job = engine.jobs.lock().unwrap().pop().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.prompt, "hi");

        job.complete(Ok(json!("hello")));
        assert_eq!(pending.wait().await.unwrap(), json!("hello"));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_rejection_answers_500_and_unparks() {
        let (intake, table, _engine) = intake(
            StubEngine { attached: true, reject: true, ..Default::default() },
            Duration::from_secs(60),
        );
        let (handle, pending) = ResponseHandle::channel();

        assert!(intake.submit(&json!({ "prompt": "hi" }), handle).is_some());
        let err = pending.wait().await.unwrap_err();
        assert!(matches!(err, RelayError::Dispatch(_)));
        assert_eq!(err.status().as_u16(), 500);
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_closed_table_answers_503() {
        let (intake, table, engine) = intake(
            StubEngine { attached: true, ..Default::default() },
            Duration::from_secs(60),
        );
        table.drain_all();
        let (handle, pending) = ResponseHandle::channel();

        assert!(intake.submit(&json!({ "prompt": "hi" }), handle).is_none());
        assert!(matches!(pending.wait().await, Err(RelayError::ShuttingDown)));
        assert!(engine.jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_answers_504() {
        let (intake, table, _engine) = intake(
            StubEngine { attached: true, ..Default::default() },
            Duration::from_millis(50),
        );
        let (handle, pending) = ResponseHandle::channel();

        intake.submit(&json!({ "prompt": "hi" }), handle).unwrap();
        let err = pending.wait().await.unwrap_err();
        assert_eq!(err.status().as_u16(), 504);
        assert!(table.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_short_timeout_answers_every_request() {
        let (intake, table, _engine) = intake(
            StubEngine { attached: true, ..Default::default() },
            Duration::from_millis(1),
        );

        let mut waiting = Vec::new();
        for _ in 0..5_000 {
            let (handle, pending) = ResponseHandle::channel();
            intake.submit(&json!({ "prompt": "hi" }), handle).unwrap();
            waiting.push(pending);
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(table.len(), 0, "entries outlived their deadline");
        for pending in waiting {
            assert_eq!(pending.wait().await.unwrap_err().status().as_u16(), 504);
        }
    }
}
