//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Own one broker generation per start/stop cycle
//! - Drain pending requests before the listener finishes closing

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::broker::Broker;
use crate::config::RelayConfig;
use crate::http::handlers::{deliver_completion, get_status, log_payload, submit_prompt};
use crate::lifecycle::Shutdown;
use crate::net::{self, ListenerError};
use crate::session::PromptEngine;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub broker: Broker,
}

struct Running {
    addr: SocketAddr,
    broker: Broker,
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

/// HTTP front end for the correlation broker.
///
/// `start` and `stop` are serialized; each start gets a fresh, empty table.
pub struct RelayServer {
    config: RelayConfig,
    engine: Arc<dyn PromptEngine>,
    running: Mutex<Option<Running>>,
}

impl RelayServer {
    pub fn new(config: RelayConfig, engine: Arc<dyn PromptEngine>) -> Self {
        Self {
            config,
            engine,
            running: Mutex::new(None),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/prompt", post(submit_prompt))
            .route("/complete/{id}", post(deliver_completion))
            .route("/log", post(log_payload))
            .route("/status", get(get_status))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(x_request_id))
                    .layer(RequestBodyLimitLayer::new(config.limits.max_body_size)),
            )
    }

    /// Bind and start serving.
    ///
    /// Returns the bound address. If already running, returns the existing
    /// address without rebinding. A bind failure leaves the server stopped,
    /// so `start` can be retried.
    pub async fn start(&self) -> Result<SocketAddr, ListenerError> {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            tracing::debug!(address = %current.addr, "Relay already running");
            return Ok(current.addr);
        }

        let listener = net::bind(&self.config.listener).await?;
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let broker = Broker::new(self.engine.clone(), self.config.timeouts.completion());
        let app = Self::build_router(
            &self.config,
            AppState {
                broker: broker.clone(),
            },
        );

        let shutdown = Shutdown::new();
        let signalled = shutdown.signalled();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signalled)
                .await
        });

        tracing::info!(
            address = %addr,
            completion_timeout_ms = self.config.timeouts.completion_ms,
            "Relay listening"
        );

        *running = Some(Running {
            addr,
            broker,
            shutdown,
            task,
        });
        Ok(addr)
    }

    /// Stop accepting, answer every pending request with `503`, and wait for
    /// the listener to close. Returns immediately when not running.
    pub async fn stop(&self) -> Result<(), ListenerError> {
        let mut running = self.running.lock().await;
        let Some(current) = running.take() else {
            return Ok(());
        };

        tracing::info!(address = %current.addr, "Relay stopping");
        current.shutdown.trigger();
        let drained = current.broker.drain();

        match current.task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ListenerError::Serve(e)),
            Err(e) => return Err(ListenerError::Serve(std::io::Error::other(e))),
        }

        tracing::info!(drained, "Relay stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.addr)
    }

    /// The broker of the current generation, if running.
    pub async fn broker(&self) -> Option<Broker> {
        self.running.lock().await.as_ref().map(|r| r.broker.clone())
    }
}
