//! Log record assembly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::capture::{sanitize, ContextValue};
use crate::dispatch::error::{BoxError, LogError};
use crate::record::format::{format, FormattedResponse};
use crate::record::outcome::Outcome;

/// Hook applied to every record before delivery.
pub type Preprocessor = Arc<dyn Fn(LogRecord) -> Result<LogRecord, BoxError> + Send + Sync>;

/// The preprocessor used when none is configured.
pub fn identity() -> Preprocessor {
    Arc::new(Ok::<LogRecord, BoxError>)
}

/// One structured access log record.
///
/// Serializes to a flat JSON object: `context`, `timestamp`, `responseTime`,
/// then either `code`/`body`/`headers` or `class`/`message`/`backtrace`,
/// then any keys a preprocessor placed in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub context: ContextValue,
    pub timestamp: DateTime<Utc>,
    /// Seconds spent in the wrapped handler.
    pub response_time: f64,
    #[serde(flatten)]
    pub response: FormattedResponse,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Builds records from captured request data.
#[derive(Clone)]
pub struct RecordBuilder {
    max_non_json_body_chunks: usize,
    preprocessor: Preprocessor,
}

impl RecordBuilder {
    pub fn new(max_non_json_body_chunks: usize) -> Self {
        Self {
            max_non_json_body_chunks,
            preprocessor: identity(),
        }
    }

    pub fn with_preprocessor<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(LogRecord) -> Result<LogRecord, BoxError> + Send + Sync + 'static,
    {
        self.preprocessor = Arc::new(preprocessor);
        self
    }

    pub(crate) fn with_shared_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn max_non_json_body_chunks(&self) -> usize {
        self.max_non_json_body_chunks
    }

    /// Sanitize, format and preprocess into the record that gets shipped.
    pub fn build(
        &self,
        context: &ContextValue,
        outcome: &Outcome,
        response_time: Duration,
    ) -> Result<LogRecord, LogError> {
        let context = sanitize(context).unwrap_or_else(|| ContextValue::Map(BTreeMap::new()));

        let raw = LogRecord {
            context,
            timestamp: Utc::now(),
            response_time: response_time.as_secs_f64(),
            response: format(outcome, self.max_non_json_body_chunks),
            extra: Map::new(),
        };

        (self.preprocessor)(raw).map_err(LogError::Preprocess)
    }
}

impl fmt::Debug for RecordBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBuilder")
            .field("max_non_json_body_chunks", &self.max_non_json_body_chunks)
            .finish_non_exhaustive()
    }
}
