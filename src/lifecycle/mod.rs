//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Start engine → RelayServer::start
//!
//! Shutdown (RelayServer::stop):
//!     Signal received → Stop accepting → Drain pending (503) → Close listener
//! ```
//!
//! # Design Decisions
//! - Pending requests are answered before the listener finishes closing
//! - A stopped server can be started again with a fresh, empty table

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
