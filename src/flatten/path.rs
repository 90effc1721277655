//! Dot-separated path resolution
//!
//! Only objects are navigated. Arrays are never indexed here; walking
//! arrays is the traverser's job.

use serde_json::Value;

/// Resolve a dot-separated path against a JSON value
///
/// The empty path yields the value itself, `null` included. Otherwise a
/// missing key, a `null` at any step, or a non-object where a key lookup is
/// needed yields `None`.
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }

    Some(current)
}
