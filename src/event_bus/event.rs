use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{BatchNumber, ItemId, RunId};

/// A progress event emitted during a pipeline run.
///
/// The run lifecycle brackets everything; batches bracket their items.
/// Per-item and per-segment failures appear here (and in the logs) so an
/// operator can diagnose them without the run halting.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum PipelineEvent {
    RunStarted {
        run_id: RunId,
        pending: usize,
        /// Results already durable from a previous run, when resuming.
        resumed_with: usize,
    },
    BatchStarted {
        batch: BatchNumber,
        size: usize,
    },
    ItemCompleted {
        batch: BatchNumber,
        id: ItemId,
    },
    ItemFailed {
        batch: BatchNumber,
        id: ItemId,
        reason: String,
    },
    /// Some of an item's segments were dropped from its aggregate embedding.
    SegmentsDropped {
        id: ItemId,
        dropped: usize,
        embedded: usize,
    },
    BatchFlushed {
        batch: BatchNumber,
        checkpointed: usize,
    },
    FlushRetried {
        batch: BatchNumber,
        attempt: u32,
        error: String,
    },
    RunCompleted {
        run_id: RunId,
        succeeded: usize,
        failed: usize,
    },
}

impl PipelineEvent {
    /// Short scope label for sinks that group output.
    #[must_use]
    pub fn scope_label(&self) -> &'static str {
        match self {
            PipelineEvent::RunStarted { .. } | PipelineEvent::RunCompleted { .. } => "run",
            PipelineEvent::BatchStarted { .. }
            | PipelineEvent::BatchFlushed { .. }
            | PipelineEvent::FlushRetried { .. } => "batch",
            PipelineEvent::ItemCompleted { .. } | PipelineEvent::ItemFailed { .. } => "item",
            PipelineEvent::SegmentsDropped { .. } => "segment",
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::RunStarted {
                run_id,
                pending,
                resumed_with,
            } => write!(
                f,
                "run {run_id} started: {pending} pending, {resumed_with} already checkpointed"
            ),
            PipelineEvent::BatchStarted { batch, size } => {
                write!(f, "batch {batch}: processing {size} items")
            }
            PipelineEvent::ItemCompleted { batch, id } => {
                write!(f, "batch {batch}: completed {id}")
            }
            PipelineEvent::ItemFailed { batch, id, reason } => {
                write!(f, "batch {batch}: failed {id}: {reason}")
            }
            PipelineEvent::SegmentsDropped {
                id,
                dropped,
                embedded,
            } => write!(
                f,
                "{id}: dropped {dropped} segment(s), {embedded} embedded"
            ),
            PipelineEvent::BatchFlushed {
                batch,
                checkpointed,
            } => write!(f, "batch {batch}: checkpoint flushed ({checkpointed} results)"),
            PipelineEvent::FlushRetried {
                batch,
                attempt,
                error,
            } => write!(f, "batch {batch}: flush attempt {attempt} failed: {error}"),
            PipelineEvent::RunCompleted {
                run_id,
                succeeded,
                failed,
            } => write!(
                f,
                "run {run_id} completed: {succeeded} succeeded, {failed} failed"
            ),
        }
    }
}
