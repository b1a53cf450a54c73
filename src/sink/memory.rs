//! In-memory sink.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::sink::{LogSink, SinkError};

/// A record as received by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub stream_name: String,
    pub data: String,
    pub partition_key: String,
}

impl StoredRecord {
    /// Parse the stored payload back into JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

/// Keeps every record in process. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<StoredRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records received so far, in arrival order.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.records.lock().expect("memory sink mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("memory sink mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn put_record(
        &self,
        stream_name: &str,
        data: String,
        partition_key: &str,
    ) -> Result<(), SinkError> {
        self.records
            .lock()
            .expect("memory sink mutex poisoned")
            .push(StoredRecord {
                stream_name: stream_name.to_string(),
                data,
                partition_key: partition_key.to_string(),
            });
        Ok(())
    }
}
