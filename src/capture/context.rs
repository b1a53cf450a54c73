//! Owned snapshot of the inbound request environment.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use serde::Serialize;

/// Header carrying the caller-supplied request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A single captured value.
///
/// Only maps, lists, strings and numbers survive sanitization. The remaining
/// variants exist so that anything found in the request environment can be
/// captured without loss and then dropped on the worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Map(BTreeMap<String, ContextValue>),
    List(Vec<ContextValue>),
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Raw bytes that are not valid UTF-8 (e.g. binary header values).
    Bytes(Vec<u8>),
    /// A handle with no data representation, named by its type.
    #[serde(skip_serializing)]
    Opaque(&'static str),
}

impl ContextValue {
    /// Build an opaque marker for a value of type `T`.
    pub fn opaque<T: ?Sized>() -> Self {
        ContextValue::Opaque(std::any::type_name::<T>())
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ContextValue>> {
        match self {
            ContextValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::String(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Integer(value.into())
    }
}

impl From<u16> for ContextValue {
    fn from(value: u16) -> Self {
        ContextValue::Integer(value.into())
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Float(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<Vec<u8>> for ContextValue {
    fn from(value: Vec<u8>) -> Self {
        ContextValue::Bytes(value)
    }
}

impl From<Vec<ContextValue>> for ContextValue {
    fn from(value: Vec<ContextValue>) -> Self {
        ContextValue::List(value)
    }
}

impl From<BTreeMap<String, ContextValue>> for ContextValue {
    fn from(value: BTreeMap<String, ContextValue>) -> Self {
        ContextValue::Map(value)
    }
}

impl<T: Into<ContextValue>> From<Option<T>> for ContextValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ContextValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ContextValue::Null,
            Value::Bool(b) => ContextValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ContextValue::Integer(i),
                None => ContextValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => ContextValue::String(s),
            Value::Array(items) => ContextValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                ContextValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// The captured request environment.
///
/// Upstream layers may insert a `RequestContext` into the request extensions
/// and handlers may insert one into the response extensions; both are merged
/// into the snapshot that gets logged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    entries: BTreeMap<String, ContextValue>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot everything worth logging from `request`.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let mut context = Self::new();
        let uri = request.uri();

        context.insert("request_method", request.method().as_str());
        context.insert("request_uri", uri.to_string());
        context.insert("path", uri.path());
        context.insert("query_string", uri.query().unwrap_or_default());
        context.insert("params", query_params(uri.query()));
        context.insert("http_version", format!("{:?}", request.version()));
        context.insert("headers", header_values(request.headers()));

        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        context.insert("request_id", request_id);

        if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
            context.insert("remote_addr", addr.ip().to_string());
            context.insert("remote_port", addr.port());
        }

        if let Some(extra) = request.extensions().get::<RequestContext>() {
            context.merge(extra.clone());
        }

        context
    }

    /// Insert a value, returning the previous one for `key`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    /// Merge `other` into this context. Keys from `other` win.
    pub fn merge(&mut self, other: RequestContext) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_value(self) -> ContextValue {
        ContextValue::Map(self.entries)
    }
}

impl From<RequestContext> for ContextValue {
    fn from(context: RequestContext) -> Self {
        context.into_value()
    }
}

impl FromIterator<(String, ContextValue)> for RequestContext {
    fn from_iter<I: IntoIterator<Item = (String, ContextValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Parse a query string into a map. Repeated keys collect into a list.
fn query_params(query: Option<&str>) -> ContextValue {
    let mut params: BTreeMap<String, ContextValue> = BTreeMap::new();

    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        let value = ContextValue::String(value.into_owned());
        match params.remove(key.as_ref()) {
            None => {
                params.insert(key.into_owned(), value);
            }
            Some(ContextValue::List(mut values)) => {
                values.push(value);
                params.insert(key.into_owned(), ContextValue::List(values));
            }
            Some(previous) => {
                params.insert(key.into_owned(), ContextValue::List(vec![previous, value]));
            }
        }
    }

    ContextValue::Map(params)
}

/// Header values keyed by lowercase name. Non UTF-8 values are kept as bytes.
fn header_values(headers: &HeaderMap) -> ContextValue {
    let mut map = BTreeMap::new();

    for name in headers.keys() {
        let mut values: Vec<ContextValue> = headers
            .get_all(name)
            .iter()
            .map(|v| match v.to_str() {
                Ok(s) => ContextValue::from(s),
                Err(_) => ContextValue::Bytes(v.as_bytes().to_vec()),
            })
            .collect();

        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            ContextValue::List(values)
        };
        map.insert(name.as_str().to_string(), value);
    }

    ContextValue::Map(map)
}
