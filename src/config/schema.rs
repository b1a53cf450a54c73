//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the access
//! log pipeline. All types derive Serde traits for deserialization from
//! config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Partition key used when none is configured.
pub const DEFAULT_PARTITION_KEY: &str = "partition1";

/// Root configuration for the access log pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Stream that receives every record. Required.
    pub stream_name: String,

    /// Routing hint passed to the sink with every record.
    pub partition_key: String,

    /// Maximum number of body chunks kept for non-JSON responses.
    pub max_non_json_body_chunks: usize,

    /// Capacity of the dispatcher queue. `None` means unbounded.
    pub queue_capacity: Option<usize>,

    /// Sink connection settings.
    pub sink: SinkConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            max_non_json_body_chunks: 10,
            queue_capacity: None,
            sink: SinkConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Connection settings for the remote sink.
///
/// Opaque to the pipeline; only the sink adapter reads them.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    pub region: Option<String>,

    /// Ingestion endpoint URL (e.g., "https://logs.example.com/records").
    pub endpoint: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            region: None,
            endpoint: None,
            timeout_secs: 5,
        }
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AccessLogConfig::default();
        assert!(config.stream_name.is_empty());
        assert_eq!(config.partition_key, DEFAULT_PARTITION_KEY);
        assert_eq!(config.max_non_json_body_chunks, 10);
        assert!(config.queue_capacity.is_none());
        assert_eq!(config.sink.timeout_secs, 5);
    }

    #[test]
    fn test_debug_hides_secret() {
        let sink = SinkConfig {
            secret_access_key: Some("hunter2".to_string()),
            ..SinkConfig::default()
        };
        let rendered = format!("{:?}", sink);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
