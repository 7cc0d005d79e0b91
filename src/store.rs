//! Work-list loading and resume-set computation.
//!
//! The [`ItemStore`] reads the work list once at process start and, given
//! the prior run's checkpoint, exposes the ordered set of items that still
//! need processing. It performs no network or filesystem side effects
//! beyond the initial load, and the pending computation is idempotent:
//! the same checkpoint always yields the same pending set.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::item::Item;
use crate::runtime::Checkpoint;

/// Errors while loading a work list.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to read work list {path}: {source}")]
    #[diagnostic(
        code(trackmill::store::io),
        help("Check that the work-list path exists and is readable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse work list {path}: {source}")]
    #[diagnostic(
        code(trackmill::store::parse),
        help("The work list must be a JSON array of item records with an `id` field.")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The immutable work list for one run.
#[derive(Clone, Debug, Default)]
pub struct ItemStore {
    items: Vec<Item>,
}

impl ItemStore {
    /// Load a JSON array of items from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let items: Vec<Item> = serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), items = items.len(), "work list loaded");
        Ok(Self { items })
    }

    /// Wrap an already-materialized work list.
    #[must_use]
    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items whose id has no recorded outcome in `checkpoint`, in input
    /// order.
    ///
    /// Items with an absent outcome are *not* pending: absence is terminal
    /// and never retried automatically. Re-running with the checkpoint a
    /// completed run produced yields an empty pending set.
    #[must_use]
    pub fn pending(&self, checkpoint: Option<&Checkpoint>) -> Vec<Item> {
        let processed: FxHashSet<_> = checkpoint
            .map(Checkpoint::recorded_ids)
            .unwrap_or_default();
        self.items
            .iter()
            .filter(|item| !processed.contains(&item.id))
            .cloned()
            .collect()
    }
}
