//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → CLI overrides applied in main
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is valid
//! - Validation separates syntactic (serde) from semantic checks
//! - Config is read once at startup; a new value needs a restart

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    EngineConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, RelayConfig, TimeoutConfig,
};
