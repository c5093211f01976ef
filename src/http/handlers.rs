//! Request handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::broker::{outcome_response, RelayError, Resolved, ResponseHandle};
use crate::http::server::AppState;
use crate::observability::metrics;

pub static X_CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// `POST /prompt`: park the request until its outcome arrives.
pub async fn submit_prompt(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Unreadable prompt body");
            metrics::record_prompt("invalid");
            return RelayError::Validation(rejection.body_text()).into_response();
        }
    };

    let (handle, pending) = ResponseHandle::channel();
    let id = state.broker.intake().submit(&body, handle);

    let mut response = outcome_response(pending.wait().await);
    if let Some(id) = id {
        if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
            response.headers_mut().insert(X_CORRELATION_ID.clone(), value);
        }
    }
    response
}

#[derive(Debug, Deserialize)]
pub struct CompletionBody {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
}

/// `POST /complete/{id}`: completion callback for out-of-process engines.
///
/// Always accepted; `delivered` tells whether a waiting caller was answered.
pub async fn deliver_completion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CompletionBody>,
) -> impl IntoResponse {
    let resolved = state.broker.sink().complete_raw(&id, body.success, body.data);
    (
        StatusCode::ACCEPTED,
        Json(json!({ "delivered": resolved == Resolved::Written })),
    )
}

/// `POST /log`: record an arbitrary payload.
pub async fn log_payload(Json(payload): Json<Value>) -> (StatusCode, &'static str) {
    tracing::info!(payload = %payload, "Received payload");
    (StatusCode::OK, "Payload received successfully")
}

#[derive(Debug, Serialize)]
pub struct RelayStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub pending: usize,
    pub oldest_pending_ms: Option<u64>,
    pub timeout_ms: u64,
}

/// `GET /status`
pub async fn get_status(State(state): State<AppState>) -> Json<RelayStatus> {
    let table = state.broker.table();
    Json(RelayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if table.is_closed() { "draining" } else { "operational" },
        pending: table.len(),
        oldest_pending_ms: table.oldest_age().map(|age| age.as_millis() as u64),
        timeout_ms: state.broker.intake().timeout().as_millis() as u64,
    })
}
