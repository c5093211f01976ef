//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use prompt_relay::config::RelayConfig;
use prompt_relay::session::{DispatchError, PromptEngine, PromptJob, SessionTarget};
use prompt_relay::RelayServer;

/// Engine that hands every accepted job to the test instead of answering it.
pub struct ManualEngine {
    attached: AtomicBool,
    reject: AtomicBool,
    jobs: mpsc::UnboundedSender<PromptJob>,
}

impl ManualEngine {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PromptJob>) {
        let (jobs, rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Self {
            attached: AtomicBool::new(true),
            reject: AtomicBool::new(false),
            jobs,
        });
        (engine, rx)
    }

    pub fn set_attached(&self, attached: bool) {
        self.attached.store(attached, Ordering::SeqCst);
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl PromptEngine for ManualEngine {
    fn resolve_target(&self, _continue_conversation: bool) -> Option<SessionTarget> {
        self.attached
            .load(Ordering::SeqCst)
            .then_some(SessionTarget::NewTask)
    }

    fn dispatch(&self, job: PromptJob) -> Result<(), DispatchError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(DispatchError::Rejected("manual engine refused".into()));
        }
        self.jobs.send(job).map_err(|_| DispatchError::Stopped)
    }
}

/// Config bound to an ephemeral local port.
pub fn test_config(completion_ms: u64) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.completion_ms = completion_ms;
    config
}

/// Start a relay and return it with its base URL.
pub async fn start_relay(
    config: RelayConfig,
    engine: Arc<dyn PromptEngine>,
) -> (Arc<RelayServer>, String) {
    let server = Arc::new(RelayServer::new(config, engine));
    let addr: SocketAddr = server.start().await.expect("relay should start");
    (server, format!("http://{}", addr))
}

/// Wait for the engine to receive the next job.
pub async fn next_job(rx: &mut mpsc::UnboundedReceiver<PromptJob>) -> PromptJob {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("job should be dispatched")
        .expect("engine channel open")
}
