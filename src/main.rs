//! Prompt relay.
//!
//! Accepts prompts over HTTP and answers each one exactly once, after an
//! asynchronous session engine finishes with it.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /prompt
//!     ─────────────▶ ┌────────┐  park + arm timer  ┌───────────────────┐
//!                    │ intake │───────────────────▶│ correlation table │
//!                    └───┬────┘                    └─────────▲─────────┘
//!                        │ PromptJob                         │ resolve (once)
//!                        ▼                                   │
//!                    ┌────────┐   complete(id, outcome)  ┌───┴──────────────┐
//!                    │ engine │─────────────────────────▶│ sink / timeout / │
//!                    └────────┘                          │ shutdown drain   │
//!     ◀───────────── 200 / 500 / 504 / 503               └──────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use prompt_relay::config::{load_config, RelayConfig};
use prompt_relay::lifecycle::signals::wait_for_signal;
use prompt_relay::observability::{logging, metrics};
use prompt_relay::{LocalEngine, RelayServer};

#[derive(Parser)]
#[command(name = "prompt-relay", version, about = "HTTP prompt relay with correlated async completions")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `timeouts.completion_ms`.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeouts.completion_ms = timeout_ms;
    }
    if let Err(errors) = prompt_relay::config::validation::validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {}", error);
        }
        return Err("invalid configuration".into());
    }

    logging::init_tracing(&config.observability)?;
    tracing::info!("prompt-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        completion_timeout_ms = config.timeouts.completion_ms,
        engine_attached = config.engine.attached,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let engine = Arc::new(LocalEngine::spawn(&config.engine));
    let server = RelayServer::new(config, engine);
    server.start().await?;

    wait_for_signal().await;
    server.stop().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
