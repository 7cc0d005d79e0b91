//! JSON helpers for working with checkpoint outcome values.

use serde_json::Value;

/// Interpret a JSON value as an embedding vector.
///
/// Returns `None` unless the value is an array whose every element is a
/// finite-representable number; a partially numeric array is not a
/// vector.
#[must_use]
pub fn as_f32_vec(value: &Value) -> Option<Vec<f32>> {
    let array = value.as_array()?;
    array
        .iter()
        .map(|component| component.as_f64().map(|f| f as f32))
        .collect()
}
