/*!
Persistence glue between in-memory results and checkpoint records.

A checkpoint file is a JSON array of Result objects: all original item
fields plus the transform's outcome field (`null` for an absence marker,
with the failure's nature in a sibling annotation field). The outcome field
name is not stored in the file; it belongs to the transform that produced
the checkpoint and is supplied by the caller on both directions.

This module intentionally does NOT perform I/O. It is pure data
transformation and (de)serialization glue; backends live in the
checkpointer modules.
*/

use miette::Diagnostic;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::item::{Item, ItemResult, Outcome};

/// Record key carrying the failure annotation next to a `null` outcome.
pub const FAILURE_KEY: &str = "failure";

/// Conversion and serialization errors for checkpoint records.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("checkpoint record is not a JSON object: {found}")]
    #[diagnostic(
        code(trackmill::persistence::not_an_object),
        help("Each element of the checkpoint array must be an object with an `id` field.")
    )]
    NotAnObject { found: &'static str },

    #[error("checkpoint is not a JSON array")]
    #[diagnostic(code(trackmill::persistence::not_an_array))]
    NotAnArray,

    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(code(trackmill::persistence::serde))]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Convert one result into its checkpoint record.
pub fn result_to_record(result: &ItemResult, outcome_field: &str) -> Result<Value> {
    let mut record = match serde_json::to_value(&result.item)? {
        Value::Object(map) => map,
        other => {
            return Err(PersistenceError::NotAnObject {
                found: value_type(&other),
            });
        }
    };
    match &result.outcome {
        Outcome::Present(value) => {
            record.insert(outcome_field.to_string(), value.clone());
            record.remove(FAILURE_KEY);
        }
        Outcome::Absent { reason } => {
            record.insert(outcome_field.to_string(), Value::Null);
            record.insert(FAILURE_KEY.to_string(), Value::String(reason.clone()));
        }
    }
    Ok(Value::Object(record))
}

/// Convert one checkpoint record back into a result.
///
/// The outcome field and failure annotation are lifted out of the record;
/// everything else round-trips into the item (unknown fields land in its
/// `extra` map). A record missing the outcome field entirely is treated as
/// an absence marker so a hand-edited file cannot masquerade as success.
pub fn record_to_result(record: Value, outcome_field: &str) -> Result<ItemResult> {
    let mut map: Map<String, Value> = match record {
        Value::Object(map) => map,
        other => {
            return Err(PersistenceError::NotAnObject {
                found: value_type(&other),
            });
        }
    };

    let outcome_value = map.remove(outcome_field);
    let failure = match map.remove(FAILURE_KEY) {
        Some(Value::String(reason)) => Some(reason),
        _ => None,
    };

    let item: Item = serde_json::from_value(Value::Object(map))?;
    let outcome = match outcome_value {
        Some(Value::Null) | None => Outcome::Absent {
            reason: failure.unwrap_or_else(|| "unrecorded failure".to_string()),
        },
        Some(value) => Outcome::Present(value),
    };

    Ok(ItemResult { item, outcome })
}

/// Serialize an ordered result sequence as the checkpoint file body.
///
/// Pretty-printed: checkpoint files double as human-inspectable progress
/// reports during long runs.
pub fn results_to_json(results: &[ItemResult], outcome_field: &str) -> Result<String> {
    let records = results
        .iter()
        .map(|result| result_to_record(result, outcome_field))
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&Value::Array(records))?)
}

/// Parse a checkpoint file body back into an ordered result sequence.
pub fn results_from_json(raw: &str, outcome_field: &str) -> Result<Vec<ItemResult>> {
    let records = match serde_json::from_str::<Value>(raw)? {
        Value::Array(records) => records,
        _ => return Err(PersistenceError::NotAnArray),
    };
    records
        .into_iter()
        .map(|record| record_to_result(record, outcome_field))
        .collect()
}
