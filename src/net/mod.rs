//! Network layer.
//!
//! Binds the TCP listener the HTTP server accepts on.

pub mod listener;

pub use listener::{bind, ListenerError};
