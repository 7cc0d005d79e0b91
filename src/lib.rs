//! # Trackmill: Checkpointed Batch Enrichment for Music Catalogs
//!
//! Trackmill is a resumable, checkpointed batch pipeline for per-item
//! external-transform jobs with partial-failure tolerance. It was built for
//! music-catalog enrichment (resolve songs to downloadable audio, push the
//! files to remote storage, compute audio embeddings for similarity search)
//! but the engine is transform-agnostic.
//!
//! ## Core Concepts
//!
//! - **Items**: immutable work records identified solely by a stable id
//! - **Transforms**: pluggable, potentially failing per-item operations
//!   (download, embed, upload) injected into one shared engine
//! - **Batches**: fixed-size groups executed on a bounded worker pool with
//!   an explicit barrier at each batch end
//! - **Checkpoint**: the one durable artifact, a JSON array of results,
//!   atomically replaced after every batch, driving idempotent resume
//! - **Segmenter**: fixed-duration slicing of long audio with per-segment
//!   failure tolerance and mean aggregation
//!
//! ## Failure Philosophy
//!
//! One item's failure never aborts its batch: transform errors (and even
//! panics) are downgraded to explicit absence markers, annotated with the
//! failure's nature, and checkpointed like any other result. Only two
//! things halt a run: invalid configuration (before any work starts) and a
//! checkpoint that cannot be made durable (after bounded retries).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trackmill::runtime::{PipelineConfig, PipelineRunner};
//! use trackmill::transforms::{DownloadTransform, YtDlpFetcher};
//!
//! # async fn example() -> miette::Result<()> {
//! let config = PipelineConfig::default()
//!     .with_work_list("youtube_matches.json")
//!     .with_checkpoint("songs_with_audio.json")
//!     .with_output_dir("downloads");
//!
//! let transform = Arc::new(DownloadTransform::new(
//!     Arc::new(YtDlpFetcher::new()),
//!     &config.output_dir,
//! ));
//!
//! let runner = PipelineRunner::new(config)?;
//! let report = runner.run(transform).await?;
//! println!("{} downloaded, {} failed", report.succeeded, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! Interrupt the process at any point and run it again: everything already
//! checkpointed is skipped, and at most one batch of work is repeated.
//!
//! ## Module Guide
//!
//! - [`item`] - Work items, outcomes, and results
//! - [`store`] - Work-list loading and pending-set computation
//! - [`transform`] - The per-item transform seam
//! - [`transforms`] - Download, embed, and upload implementations
//! - [`segment`] - Audio segmentation and mean aggregation
//! - [`audio`] / [`model`] - Injected decoding and model capabilities
//! - [`runtime`] - Scheduler, checkpointing, configuration, runner
//! - [`event_bus`] - Progress events with pluggable sinks

pub mod audio;
pub mod event_bus;
pub mod item;
pub mod model;
pub mod runtime;
pub mod segment;
pub mod store;
pub mod telemetry;
pub mod transform;
pub mod transforms;
pub mod types;
pub mod utils;
