//! High-level orchestration of one pipeline run.
//!
//! [`PipelineRunner`] wires the pieces together: it validates the
//! configuration, loads the work list and the prior run's checkpoint,
//! computes the pending set, drives the [`BatchScheduler`], and emits run
//! lifecycle events. The transform is injected, so the same runner serves
//! download, embed, and upload stages.

use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::event_bus::{EventBus, PipelineEvent};
use crate::store::{ItemStore, StoreError};
use crate::transform::Transform;
use crate::types::RunId;
use crate::utils::id_generator::IdGenerator;

use super::checkpointer::{Checkpoint, Checkpointer, CheckpointerError};
use super::checkpointer_json::JsonCheckpointer;
use super::config::{ConfigError, PipelineConfig};
use super::scheduler::{BatchScheduler, RunReport, SchedulerError};

/// How a run's checkpoint state was initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunInit {
    Fresh,
    Resumed { checkpointed: usize },
}

/// Fatal run errors; per-item failures never surface here.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpointer(#[from] CheckpointerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Runtime environment for pipeline runs: configuration, checkpoint
/// persistence, and the event bus.
pub struct PipelineRunner {
    config: PipelineConfig,
    checkpointer: Arc<dyn Checkpointer>,
    event_bus: EventBus,
    run_id: RunId,
}

impl PipelineRunner {
    /// Create a runner with a [`JsonCheckpointer`] at the configured path
    /// and the default stdout event bus.
    ///
    /// Fails fast on invalid configuration, before any item is processed.
    pub fn new(config: PipelineConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let checkpointer = Arc::new(JsonCheckpointer::new(&config.checkpoint));
        Self::with_checkpointer(config, checkpointer)
    }

    /// Create a runner with an explicit persistence backend.
    pub fn with_checkpointer(
        config: PipelineConfig,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        let event_bus = EventBus::default();
        event_bus.listen_for_events();
        Ok(Self {
            config,
            checkpointer,
            event_bus,
            run_id: IdGenerator::new().generate_run_id(),
        })
    }

    /// Replace the event bus (e.g. to capture events in memory or stream
    /// them to a live consumer). Starts the new bus's listener.
    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        event_bus.listen_for_events();
        self.event_bus = event_bus;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Load the work list from the configured path and run `transform`
    /// over everything still pending.
    #[instrument(skip(self, transform), fields(run_id = %self.run_id), err)]
    pub async fn run(&self, transform: Arc<dyn Transform>) -> Result<RunReport, RunnerError> {
        let store = ItemStore::load(&self.config.work_list).await?;
        self.run_with_store(&store, transform).await
    }

    /// Run `transform` over an already-loaded work list.
    pub async fn run_with_store(
        &self,
        store: &ItemStore,
        transform: Arc<dyn Transform>,
    ) -> Result<RunReport, RunnerError> {
        let outcome_field = transform.outcome_field();
        let mut checkpoint = self
            .checkpointer
            .load(outcome_field)
            .await?
            .unwrap_or_else(|| Checkpoint::new(outcome_field));

        let init = if checkpoint.is_empty() {
            RunInit::Fresh
        } else {
            RunInit::Resumed {
                checkpointed: checkpoint.len(),
            }
        };

        let pending = store.pending(Some(&checkpoint));
        info!(
            run_id = %self.run_id,
            outcome_field,
            pending = pending.len(),
            ?init,
            "run starting"
        );
        let _ = self.event_bus.get_sender().send(PipelineEvent::RunStarted {
            run_id: self.run_id.clone(),
            pending: pending.len(),
            resumed_with: checkpoint.len(),
        });

        let scheduler = BatchScheduler::from_config(&self.config)?;
        let report = scheduler
            .run(
                pending,
                transform,
                &mut checkpoint,
                self.checkpointer.as_ref(),
                self.event_bus.get_sender(),
            )
            .await?;

        info!(
            run_id = %self.run_id,
            batches = report.batches,
            succeeded = report.succeeded,
            failed = report.failed,
            "run completed"
        );
        let _ = self
            .event_bus
            .get_sender()
            .send(PipelineEvent::RunCompleted {
                run_id: self.run_id.clone(),
                succeeded: report.succeeded,
                failed: report.failed,
            });

        Ok(report)
    }
}
