//! Work items and their transform outcomes.
//!
//! An [`Item`] is one immutable unit of work (a song record) carried through
//! the pipeline. An [`ItemResult`] is an Item annotated with an [`Outcome`]:
//! either the value a transform produced, or an explicit absence marker.
//! Absence is terminal (an item whose outcome is absent is never retried
//! automatically) and is distinct from "not yet processed", which is the
//! absence of any result record at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::types::ItemId;

/// One unit of work: a song record with a stable id and payload fields.
///
/// Identity is defined solely by [`id`](Item::id). The typed fields cover
/// what the built-in transforms consume and produce (`source_url` for
/// download, `local_path` for embed/upload, `remote_url` after upload);
/// every unknown payload field is preserved verbatim in `extra` so a record
/// survives all pipeline stages intact.
///
/// Items are read once at process start and are immutable for the run.
///
/// # Examples
///
/// ```rust
/// use trackmill::item::Item;
///
/// let item: Item = serde_json::from_str(
///     r#"{"id": "t1", "title": "Holiday", "artist": "Phish",
///         "youtube_views": 123, "source_url": "https://yt/abc"}"#,
/// ).unwrap();
/// assert_eq!(item.id.as_str(), "t1");
/// assert_eq!(item.extra["youtube_views"], 123);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Source URL consumed by the download transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Local audio file path, produced by download, consumed by embed/upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Remote storage URL, produced by upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    /// Payload fields not interpreted by any transform, carried through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Item {
    /// Create a minimal item with only an id.
    #[must_use]
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            artist: None,
            source_url: None,
            local_path: None,
            remote_url: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

/// Outcome of applying a transform to one item.
///
/// `Present` carries the transform's value (a local path, a remote URL, an
/// embedding vector). `Absent` is the explicit absence marker: the item was
/// processed and the transform could not produce a value, with the failure's
/// nature recorded in `reason`. In the checkpoint file an absent outcome
/// serializes as JSON `null` under the transform's outcome field.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Present(Value),
    Absent { reason: String },
}

impl Outcome {
    /// Build an absent outcome from any displayable failure.
    #[must_use]
    pub fn absent(reason: impl Into<String>) -> Self {
        Outcome::Absent {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Outcome::Present(_))
    }

    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent { .. })
    }

    /// The outcome value, if present.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Present(v) => Some(v),
            Outcome::Absent { .. } => None,
        }
    }
}

/// An [`Item`] plus the [`Outcome`] a transform produced for it.
///
/// Results are created by workers, returned by value to the coordinating
/// task, appended to the in-memory batch accumulator, and flushed into the
/// checkpoint at batch boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemResult {
    pub item: Item,
    pub outcome: Outcome,
}

impl ItemResult {
    #[must_use]
    pub fn completed(item: Item, value: Value) -> Self {
        Self {
            item,
            outcome: Outcome::Present(value),
        }
    }

    #[must_use]
    pub fn failed(item: Item, reason: impl Into<String>) -> Self {
        Self {
            item,
            outcome: Outcome::absent(reason),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.item.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_round_trip() {
        let json = r#"{"id": 9, "title": "Reba", "album": "Lawn Boy"}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id.as_str(), "9");
        assert_eq!(item.extra["album"], "Lawn Boy");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["album"], "Lawn Boy");
        assert!(back.get("source_url").is_none());
    }

    #[test]
    fn absent_is_not_present() {
        let out = Outcome::absent("tool failure");
        assert!(out.is_absent());
        assert!(out.value().is_none());
    }
}
