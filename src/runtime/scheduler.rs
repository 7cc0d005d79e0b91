//! Batch scheduling: bounded-concurrency execution with per-batch
//! checkpoint flushes.
//!
//! Pending items are split into consecutive fixed-size batches. Within a
//! batch each item's transform runs on a bounded worker pool; the scheduler
//! waits for every submission (an explicit barrier, not fire-and-forget),
//! then appends the batch's results to the checkpoint in arrival order and
//! flushes before the next batch starts. A crash therefore loses at most
//! one batch of work, and one item's failure never aborts its batch.

use futures_util::FutureExt;
use miette::Diagnostic;
use rand::Rng;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, info_span, instrument, warn};

use crate::event_bus::PipelineEvent;
use crate::item::{Item, ItemResult, Outcome};
use crate::transform::{Transform, TransformContext};
use crate::types::BatchNumber;

use super::checkpointer::{Checkpoint, Checkpointer, CheckpointerError};
use super::config::{ConfigError, PipelineConfig};

const FLUSH_BACKOFF_BASE_MS: u64 = 200;
const FLUSH_BACKOFF_JITTER_MS: u64 = 100;

/// Summary of one scheduler run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Batches executed (and flushed).
    pub batches: u64,
    /// Items processed this run.
    pub processed: usize,
    /// Results with a present outcome.
    pub succeeded: usize,
    /// Results downgraded to an absence marker.
    pub failed: usize,
}

/// Fatal scheduler errors. Item-scoped failures never appear here; they
/// are downgraded to absence markers inside the batch.
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("worker task join error: {0}")]
    #[diagnostic(code(trackmill::scheduler::join))]
    Join(#[from] JoinError),

    #[error("checkpoint flush failed after {attempts} attempts: {source}")]
    #[diagnostic(
        code(trackmill::scheduler::flush_exhausted),
        help("Durability takes priority over throughput: the run halts rather than advance past an unflushed checkpoint.")
    )]
    FlushExhausted {
        attempts: u32,
        #[source]
        source: CheckpointerError,
    },
}

/// Runs transforms over pending items in checkpointed batches.
#[derive(Clone, Debug)]
pub struct BatchScheduler {
    batch_size: usize,
    worker_count: usize,
    flush_attempts: u32,
}

impl BatchScheduler {
    /// Create a scheduler, rejecting zero sizes before any work starts.
    pub fn new(
        batch_size: usize,
        worker_count: usize,
        flush_attempts: u32,
    ) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if worker_count == 0 {
            return Err(ConfigError::ZeroWorkerCount);
        }
        if flush_attempts == 0 {
            return Err(ConfigError::ZeroFlushAttempts);
        }
        Ok(Self {
            batch_size,
            worker_count,
            flush_attempts,
        })
    }

    /// Build from a validated [`PipelineConfig`].
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Self::new(config.batch_size, config.worker_count, config.flush_attempts)
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Run `transform` over `pending`, appending into `checkpoint` and
    /// flushing through `checkpointer` at every batch boundary.
    ///
    /// Batch-to-batch and flush-to-flush ordering are strict: batch N's
    /// flush is durable before batch N+1 starts. Completion order within a
    /// batch is unspecified.
    #[instrument(skip_all, fields(pending = pending.len()), err)]
    pub async fn run(
        &self,
        pending: Vec<Item>,
        transform: Arc<dyn Transform>,
        checkpoint: &mut Checkpoint,
        checkpointer: &dyn Checkpointer,
        events: flume::Sender<PipelineEvent>,
    ) -> Result<RunReport, SchedulerError> {
        let mut report = RunReport::default();

        for (index, chunk) in pending.chunks(self.batch_size).enumerate() {
            let batch = (index + 1) as BatchNumber;
            let span = info_span!("batch", batch, size = chunk.len());

            let _ = events.send(PipelineEvent::BatchStarted {
                batch,
                size: chunk.len(),
            });

            let results = self
                .run_batch(batch, chunk, Arc::clone(&transform), &events)
                .instrument(span)
                .await?;

            for result in &results {
                match &result.outcome {
                    Outcome::Present(_) => report.succeeded += 1,
                    Outcome::Absent { .. } => report.failed += 1,
                }
            }
            report.processed += results.len();
            report.batches = batch;

            checkpoint.append(results);
            self.flush_with_retry(checkpoint, checkpointer, batch, &events)
                .await?;

            let _ = events.send(PipelineEvent::BatchFlushed {
                batch,
                checkpointed: checkpoint.len(),
            });
        }

        Ok(report)
    }

    /// Execute one batch on the worker pool and collect every result:
    /// the explicit barrier of the pipeline.
    async fn run_batch(
        &self,
        batch: BatchNumber,
        chunk: &[Item],
        transform: Arc<dyn Transform>,
        events: &flume::Sender<PipelineEvent>,
    ) -> Result<Vec<ItemResult>, SchedulerError> {
        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut join_set = JoinSet::new();

        for item in chunk.iter().cloned() {
            let transform = Arc::clone(&transform);
            let semaphore = Arc::clone(&semaphore);
            let ctx = TransformContext {
                batch,
                event_sender: events.clone(),
            };
            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return ItemResult::failed(item, "worker pool closed");
                };
                apply_one(transform.as_ref(), item, ctx).await
            });
        }

        let mut results = Vec::with_capacity(chunk.len());
        while let Some(joined) = join_set.join_next().await {
            let result = joined?;
            let event = match &result.outcome {
                Outcome::Present(_) => PipelineEvent::ItemCompleted {
                    batch,
                    id: result.id().clone(),
                },
                Outcome::Absent { reason } => PipelineEvent::ItemFailed {
                    batch,
                    id: result.id().clone(),
                    reason: reason.clone(),
                },
            };
            let _ = events.send(event);
            results.push(result);
        }
        Ok(results)
    }

    /// Flush, retrying with jittered backoff; exhaustion is fatal.
    async fn flush_with_retry(
        &self,
        checkpoint: &Checkpoint,
        checkpointer: &dyn Checkpointer,
        batch: BatchNumber,
        events: &flume::Sender<PipelineEvent>,
    ) -> Result<(), SchedulerError> {
        let mut attempt = 1u32;
        loop {
            match checkpointer.flush(checkpoint).await {
                Ok(()) => return Ok(()),
                Err(source) if attempt < self.flush_attempts => {
                    warn!(
                        batch,
                        attempt,
                        error = %source,
                        "checkpoint flush failed; retrying"
                    );
                    let _ = events.send(PipelineEvent::FlushRetried {
                        batch,
                        attempt,
                        error: source.to_string(),
                    });
                    let jitter = rand::rng().random_range(0..FLUSH_BACKOFF_JITTER_MS);
                    let backoff = FLUSH_BACKOFF_BASE_MS << (attempt - 1);
                    tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(SchedulerError::FlushExhausted {
                        attempts: self.flush_attempts,
                        source,
                    });
                }
            }
        }
    }
}

/// Apply the transform to one item, downgrading any failure (error or
/// panic) to an absence-marker result so it cannot cross the worker
/// boundary.
async fn apply_one(transform: &dyn Transform, item: Item, ctx: TransformContext) -> ItemResult {
    let applied = AssertUnwindSafe(transform.apply(&item, ctx))
        .catch_unwind()
        .await;
    match applied {
        Ok(Ok(value)) => ItemResult::completed(item, value),
        Ok(Err(err)) => {
            warn!(id = %item.id, error = %err, "transform failed; recording absence");
            let reason = err.to_string();
            ItemResult::failed(item, reason)
        }
        Err(payload) => {
            let reason = format!("transform panicked: {}", panic_reason(payload.as_ref()));
            warn!(id = %item.id, %reason, "transform panicked; recording absence");
            ItemResult::failed(item, reason)
        }
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
