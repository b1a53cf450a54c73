//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required routing fields are present (stream name, partition key)
//! - Validate value ranges (queue capacity > 0)
//! - Validate addresses (sink endpoint URL, metrics bind address)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AccessLogConfig → Result<(), Vec<ValidationError>>
//! - Runs before the pipeline is started

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::AccessLogConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("stream_name must not be empty")]
    EmptyStreamName,

    #[error("partition_key must not be empty")]
    EmptyPartitionKey,

    #[error("queue_capacity must be at least 1 when set")]
    ZeroQueueCapacity,

    #[error("sink.endpoint is required when no sink is supplied")]
    MissingEndpoint,

    #[error("sink.endpoint {0:?} is not a valid http(s) URL")]
    InvalidEndpoint(String),

    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &AccessLogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.stream_name.trim().is_empty() {
        errors.push(ValidationError::EmptyStreamName);
    }

    if config.partition_key.is_empty() {
        errors.push(ValidationError::EmptyPartitionKey);
    }

    if config.queue_capacity == Some(0) {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    if let Some(endpoint) = &config.sink.endpoint {
        let valid = Url::parse(endpoint)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidEndpoint(endpoint.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AccessLogConfig {
        AccessLogConfig {
            stream_name: "http-logs".to_string(),
            ..AccessLogConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_default_config_requires_stream_name() {
        let errors = validate_config(&AccessLogConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyStreamName]);
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid();
        config.stream_name = "   ".to_string();
        config.partition_key = String::new();
        config.queue_capacity = Some(0);
        config.sink.endpoint = Some("ftp://logs.example.com".to_string());
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyStreamName,
                ValidationError::EmptyPartitionKey,
                ValidationError::ZeroQueueCapacity,
                ValidationError::InvalidEndpoint("ftp://logs.example.com".to_string()),
                ValidationError::InvalidMetricsAddress("not-an-address".to_string()),
            ]
        );
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = valid();
        config.observability.metrics_address = "garbage".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
