//! Shipping a finished record to the sink.

use crate::dispatch::error::LogError;
use crate::record::builder::LogRecord;
use crate::sink::LogSink;

/// Where records are routed within the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub stream_name: String,
    pub partition_key: String,
}

/// Serialize `record` to JSON and hand it to `sink`.
pub async fn deliver(record: &LogRecord, sink: &dyn LogSink, route: &Route) -> Result<(), LogError> {
    let data = serde_json::to_string(record)?;
    sink.put_record(&route.stream_name, data, &route.partition_key)
        .await?;
    Ok(())
}
