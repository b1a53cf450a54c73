//! HTTP ingestion sink.
//!
//! Posts each record as a JSON envelope to a remote ingestion endpoint:
//!
//! ```text
//! POST {endpoint}
//! x-access-key-id: <access_key_id>
//! x-region: <region>
//! authorization: Bearer <secret_access_key>
//!
//! {"stream_name": "...", "partition_key": "...", "data": "<serialized record>"}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::SinkConfig;
use crate::config::validation::ValidationError;
use crate::sink::{LogSink, SinkError};

const ACCESS_KEY_HEADER: &str = "x-access-key-id";
const REGION_HEADER: &str = "x-region";

#[derive(Serialize)]
struct PutRecordRequest<'a> {
    stream_name: &'a str,
    partition_key: &'a str,
    data: &'a str,
}

/// Sink that ships records to a remote endpoint with `reqwest`.
#[derive(Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: Url,
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    region: Option<String>,
}

impl HttpSink {
    /// Build the sink from connection settings.
    ///
    /// Fails if no endpoint is configured or the HTTP client cannot be built.
    pub fn from_config(config: &SinkConfig) -> Result<Self, ConfigError> {
        let raw = config
            .endpoint
            .as_deref()
            .ok_or_else(|| ConfigError::Validation(vec![ValidationError::MissingEndpoint]))?;
        let endpoint = Url::parse(raw).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidEndpoint(raw.to_string())])
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Self {
            client,
            endpoint,
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            region: config.region.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn put_record(
        &self,
        stream_name: &str,
        data: String,
        partition_key: &str,
    ) -> Result<(), SinkError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&PutRecordRequest {
            stream_name,
            partition_key,
            data: &data,
        });

        if let Some(key) = &self.access_key_id {
            request = request.header(ACCESS_KEY_HEADER, key);
        }
        if let Some(region) = &self.region {
            request = request.header(REGION_HEADER, region);
        }
        if let Some(secret) = &self.secret_access_key {
            request = request.bearer_auth(secret);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::trace!(stream_name, status = %status, "Record accepted by sink");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
