//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AccessLogConfig (validated, immutable)
//!     → AccessLogBuilder::build (sink + dispatcher wired once)
//!     → shared via Arc to every middleware instance
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the pipeline is built; there is no reload
//! - All fields have defaults except the stream name
//! - Validation separates syntactic (serde) from semantic checks
//! - Bad configuration fails fast at startup, never per request

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AccessLogConfig, ObservabilityConfig, SinkConfig, DEFAULT_PARTITION_KEY};
pub use validation::{validate_config, ValidationError};
