//! The checkpoint accumulator and the persistence trait around it.
//!
//! The [`Checkpoint`] is the only state that outlives a process. It is
//! owned exclusively by the scheduler/runner pair: workers return results
//! by value and only the coordinating task appends and flushes, so the
//! structure needs no locking of its own.

use async_trait::async_trait;
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::item::ItemResult;
use crate::types::ItemId;

use super::persistence::PersistenceError;

/// Ordered sequence of results produced so far for one outcome field.
///
/// Invariants:
/// - results are append-only within a run; a flush never drops a
///   previously durable result, so the set of ids with a non-absent
///   outcome is monotonically non-decreasing across runs;
/// - an absence-marker result is terminal: its id is excluded from the
///   pending set on resume and is never retried automatically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Checkpoint {
    outcome_field: String,
    results: Vec<ItemResult>,
}

impl Checkpoint {
    /// Start an empty checkpoint for the given outcome field.
    #[must_use]
    pub fn new(outcome_field: impl Into<String>) -> Self {
        Self {
            outcome_field: outcome_field.into(),
            results: Vec::new(),
        }
    }

    /// Rebuild a checkpoint from results loaded by a backend.
    #[must_use]
    pub fn from_results(outcome_field: impl Into<String>, results: Vec<ItemResult>) -> Self {
        Self {
            outcome_field: outcome_field.into(),
            results,
        }
    }

    /// JSON key the outcomes are stored under.
    #[must_use]
    pub fn outcome_field(&self) -> &str {
        &self.outcome_field
    }

    #[must_use]
    pub fn results(&self) -> &[ItemResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Append one batch's results in arrival order.
    pub fn append(&mut self, results: impl IntoIterator<Item = ItemResult>) {
        self.results.extend(results);
    }

    /// Ids with any recorded outcome, present or absent. This is the set
    /// the pending computation excludes: absence is terminal.
    #[must_use]
    pub fn recorded_ids(&self) -> FxHashSet<&ItemId> {
        self.results.iter().map(ItemResult::id).collect()
    }

    /// Ids with a non-absent outcome: the monotonic progress set.
    #[must_use]
    pub fn processed_ids(&self) -> FxHashSet<&ItemId> {
        self.results
            .iter()
            .filter(|result| result.outcome.is_present())
            .map(ItemResult::id)
            .collect()
    }

    /// Number of results with a present outcome.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome.is_present())
            .count()
    }

    /// Number of results carrying an absence marker.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }
}

/// Errors surfaced by checkpoint persistence backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("checkpoint I/O failed: {source}")]
    #[diagnostic(
        code(trackmill::checkpointer::io),
        help("Check disk space and permissions on the checkpoint path.")
    )]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(trackmill::checkpointer::persistence))]
    Persistence(#[from] PersistenceError),

    #[error("backend error: {message}")]
    #[diagnostic(code(trackmill::checkpointer::backend))]
    Backend { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Pluggable checkpoint persistence.
///
/// `flush` must be atomic with respect to crashes: after any failure the
/// previously durable checkpoint is still intact and parseable. The
/// scheduler treats a flush failure as retryable and never advances past
/// an unflushed checkpoint.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist the whole checkpoint, replacing the previous one.
    async fn flush(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Load the durable checkpoint, if any, interpreting outcomes under
    /// `outcome_field`.
    async fn load(&self, outcome_field: &str) -> Result<Option<Checkpoint>>;
}

/// Available checkpointer backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointerType {
    InMemory,
    JsonFile,
}

/// Volatile checkpointer for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointer {
    slot: Mutex<Option<Checkpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn flush(&self, checkpoint: &Checkpoint) -> Result<()> {
        *self.slot.lock() = Some(checkpoint.clone());
        Ok(())
    }

    async fn load(&self, outcome_field: &str) -> Result<Option<Checkpoint>> {
        let slot = self.slot.lock();
        match slot.as_ref() {
            Some(stored) if stored.outcome_field() == outcome_field => Ok(Some(stored.clone())),
            Some(stored) => Err(CheckpointerError::Backend {
                message: format!(
                    "stored checkpoint carries outcome field `{}`, requested `{}`",
                    stored.outcome_field(),
                    outcome_field
                ),
            }),
            None => Ok(None),
        }
    }
}
