//! Prompt relay library.
//!
//! An HTTP front end that parks each prompt under a correlation id, hands it
//! to a session engine, and answers the caller once the engine completes,
//! the deadline passes, or the listener shuts down.

pub mod broker;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;

pub use broker::{Broker, CompletionSink, CorrelationId, RelayError};
pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use session::{LocalEngine, PromptEngine};
