//! TCP listener binding.
//!
//! # Responsibilities
//! - Parse and bind the configured address
//! - Report bind failures without leaving half-started state behind

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured address is not a socket address.
    Address(String),
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// The serve loop ended with an I/O error.
    Serve(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(addr) => write!(f, "Invalid bind address: {}", addr),
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = config
        .bind_address
        .parse()
        .map_err(|_| ListenerError::Address(config.bind_address.clone()))?;

    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
