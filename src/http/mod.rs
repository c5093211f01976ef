//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, start/stop)
//!     → handlers.rs
//!         POST /prompt         → broker intake, await parked outcome
//!         POST /complete/{id}  → broker completion sink
//!         POST /log            → log payload
//!         GET  /status         → pending count and age
//! ```

pub mod handlers;
pub mod server;

pub use handlers::X_CORRELATION_ID;
pub use server::{AppState, RelayServer, X_REQUEST_ID};
