//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML and default
//! every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Completion deadline.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Built-in session engine.
    pub engine: EngineConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:30006"). Port 0 picks a free port.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:30006".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a parked prompt waits for its completion, in milliseconds.
    pub completion_ms: u64,
}

impl TimeoutConfig {
    pub fn completion(&self) -> Duration {
        Duration::from_millis(self.completion_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            completion_ms: 180_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Settings for the in-process session engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether a session is available at startup.
    pub attached: bool,

    /// Prompts that may wait for the worker before dispatch is refused.
    pub queue_capacity: usize,

    /// Artificial delay before each reply, in milliseconds.
    pub reply_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attached: true,
            queue_capacity: 64,
            reply_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_filter: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address for the Prometheus scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "prompt_relay=debug,tower_http=debug".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.timeouts.completion(), Duration::from_millis(180_000));
        assert_eq!(config.listener.bind_address, "127.0.0.1:30006");
        assert!(config.engine.attached);
    }

    #[test]
    fn test_partial_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
            [timeouts]
            completion_ms = 2500

            [engine]
            queue_capacity = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.completion_ms, 2500);
        assert_eq!(config.engine.queue_capacity, 4);
        assert!(config.engine.attached);
        assert_eq!(config.limits.max_body_size, 1024 * 1024);
    }
}
