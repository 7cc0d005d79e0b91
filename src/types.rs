//! Core identifier types for the trackmill pipeline.
//!
//! This module defines the fundamental types used throughout the crate for
//! identifying items and runs. Runtime execution types (reports, batch
//! numbering) live with the scheduler in [`crate::runtime`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stable unique identifier of a work [`Item`](crate::item::Item).
///
/// Identity is defined solely by this value; every other item field is
/// payload. Work lists in the wild carry both string and numeric ids, so
/// deserialization normalizes either form to its string representation;
/// an item checkpointed under id `42` and re-read from a work list as
/// `"42"` is the same item.
///
/// # Examples
///
/// ```rust
/// use trackmill::types::ItemId;
///
/// let a: ItemId = serde_json::from_str("\"7tr4ck\"").unwrap();
/// let b: ItemId = serde_json::from_str("42").unwrap();
/// assert_eq!(a.as_str(), "7tr4ck");
/// assert_eq!(b.as_str(), "42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(String);

impl ItemId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => ItemId(s),
            Repr::Number(n) => ItemId(n.to_string()),
        })
    }
}

/// Identifier of one pipeline run, carried on lifecycle events and logs.
pub type RunId = String;

/// One-based batch number within a run.
pub type BatchNumber = u64;
