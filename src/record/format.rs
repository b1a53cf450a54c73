//! Response formatting and body truncation policy.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::outcome::Outcome;

/// Formatted response fields, flattened into the log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormattedResponse {
    Success {
        code: u16,
        body: Vec<String>,
        headers: BTreeMap<String, String>,
    },
    Failure {
        #[serde(rename = "class")]
        error_class: String,
        message: String,
        backtrace: Vec<String>,
    },
}

/// True if the content type denotes a JSON payload.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.contains("json")
}

/// Find the `Content-Type` value in a flattened header map.
pub fn content_type(headers: &BTreeMap<String, String>) -> Option<&str> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.as_str())
}

/// Format an outcome for logging.
///
/// JSON bodies are kept whole. Any other body is cut to the first
/// `max_non_json_body_chunks` chunks.
pub fn format(outcome: &Outcome, max_non_json_body_chunks: usize) -> FormattedResponse {
    match outcome {
        Outcome::Failure {
            error_class,
            message,
            backtrace,
        } => FormattedResponse::Failure {
            error_class: error_class.clone(),
            message: message.clone(),
            backtrace: backtrace.clone(),
        },
        Outcome::Success {
            status,
            headers,
            body,
        } => {
            let keep = if content_type(headers).is_some_and(is_json_content_type) {
                body.len()
            } else {
                body.len().min(max_non_json_body_chunks)
            };

            FormattedResponse::Success {
                code: *status,
                body: body[..keep]
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                    .collect(),
                headers: headers.clone(),
            }
        }
    }
}
