//! Pipeline runtime: batching, checkpoint persistence, and resumable runs.
//!
//! The runtime layer drives transforms over the pending work set with
//! support for checkpointing and resume, abstracting over persistence
//! backends behind one trait.
//!
//! # Architecture
//!
//! - **[`PipelineRunner`]** - high-level orchestration of one run
//! - **[`BatchScheduler`]** - fixed-size batches over a bounded worker pool,
//!   with an explicit barrier and a checkpoint flush per batch
//! - **[`Checkpointer`]** - trait for pluggable checkpoint persistence
//! - **[`PipelineConfig`]** - validated configuration surface
//! - **Persistence models** - serde glue between in-memory results and the
//!   checkpoint file format
//!
//! # Persistence backends
//!
//! - **[`InMemoryCheckpointer`]** - volatile storage for tests/development
//! - **[`JsonCheckpointer`]** - durable JSON array file with atomic replace
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trackmill::runtime::{PipelineConfig, PipelineRunner};
//! use trackmill::transforms::{DownloadTransform, YtDlpFetcher};
//!
//! # async fn example() -> miette::Result<()> {
//! let config = PipelineConfig::from_env()?;
//! let transform = Arc::new(DownloadTransform::new(
//!     Arc::new(YtDlpFetcher::new()),
//!     &config.output_dir,
//! ));
//! let runner = PipelineRunner::new(config)?;
//! let report = runner.run(transform).await?;
//! println!("{} succeeded, {} failed", report.succeeded, report.failed);
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
pub mod checkpointer_json;
pub mod config;
pub mod persistence;
pub mod runner;
pub mod scheduler;

pub use checkpointer::{
    Checkpoint, Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
};
pub use checkpointer_json::JsonCheckpointer;
pub use config::{ConfigError, PipelineConfig};
pub use persistence::{FAILURE_KEY, PersistenceError, record_to_result, result_to_record};
pub use runner::{PipelineRunner, RunInit, RunnerError};
pub use scheduler::{BatchScheduler, RunReport, SchedulerError};
