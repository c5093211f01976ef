//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! broker / http / session produce:
//!     → tracing events (correlation_id on every broker event)
//!     → metrics.rs (counters, gauge, histogram)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
