//! Reduce captured values to a safe, serializable subset.

use crate::capture::context::ContextValue;

/// Recursively keep only maps, lists, strings and numbers.
///
/// Returns `None` when `value` itself must be dropped. Map entries and list
/// elements that sanitize to `None` are removed; the remaining keys and the
/// order of the remaining elements are preserved. Containers that become
/// empty are kept.
pub fn sanitize(value: &ContextValue) -> Option<ContextValue> {
    match value {
        ContextValue::Map(map) => Some(ContextValue::Map(
            map.iter()
                .filter_map(|(key, value)| sanitize(value).map(|v| (key.clone(), v)))
                .collect(),
        )),
        ContextValue::List(items) => Some(ContextValue::List(
            items.iter().filter_map(sanitize).collect(),
        )),
        ContextValue::String(_) | ContextValue::Integer(_) => Some(value.clone()),
        // NaN and infinities have no JSON number representation
        ContextValue::Float(f) if f.is_finite() => Some(value.clone()),
        _ => None,
    }
}

/// True if `value` contains only maps, lists, strings and finite numbers.
pub fn is_sanitized(value: &ContextValue) -> bool {
    match value {
        ContextValue::Map(map) => map.values().all(is_sanitized),
        ContextValue::List(items) => items.iter().all(is_sanitized),
        ContextValue::String(_) | ContextValue::Integer(_) => true,
        ContextValue::Float(f) => f.is_finite(),
        _ => false,
    }
}
