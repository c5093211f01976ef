//! Terminal outcomes and the caller-facing error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::broker::id::CorrelationId;

/// The single terminal result written back to a waiting caller.
pub type Outcome = Result<Value, RelayError>;

/// Errors that end a request.
///
/// Every variant is delivered through the request's response handle; none of
/// them propagate past the component that detected it.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// Malformed or missing input.
    #[error("Bad Request: {0}")]
    Validation(String),

    /// No active session can receive the prompt.
    #[error("{0}")]
    Unavailable(String),

    /// The engine refused the prompt at submission time.
    #[error("Failed to start prompt: {0}")]
    Dispatch(String),

    /// The engine accepted the prompt but later reported a failure.
    #[error("Prompt processing failed")]
    SubsystemFailure { details: Value },

    /// No outcome arrived before the deadline.
    #[error("No response within {} ms", .0.as_millis())]
    TimedOut(Duration),

    /// The listener is closing and the request was drained.
    #[error("Service is shutting down")]
    ShuttingDown,

    /// An identifier was registered twice. Indicates a logic bug.
    #[error("Correlation id {0} is already registered")]
    DuplicateId(CorrelationId),
}

impl RelayError {
    /// HTTP status used when this error is surfaced to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Unavailable(_) => StatusCode::NOT_FOUND,
            RelayError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::SubsystemFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::DuplicateId(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "validation",
            RelayError::Unavailable(_) => "unavailable",
            RelayError::Dispatch(_) => "dispatch",
            RelayError::SubsystemFailure { .. } => "subsystem_failure",
            RelayError::TimedOut(_) => "timeout",
            RelayError::ShuttingDown => "shutting_down",
            RelayError::DuplicateId(_) => "duplicate_id",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RelayError::SubsystemFailure { details } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Render an outcome as the HTTP response for `POST /prompt`.
pub fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Ok(payload) => (StatusCode::OK, Json(json!({ "response": payload }))).into_response(),
        Err(e) => e.into_response(),
    }
}
