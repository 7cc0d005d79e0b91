//! The per-item transform seam of the pipeline.
//!
//! This module provides the core abstraction for pluggable item operations:
//! the [`Transform`] trait, its execution context, and its error ladder.
//! Download, embed, and upload (see [`crate::transforms`]) are independent
//! implementations sharing one scheduling/checkpointing engine.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

use crate::event_bus::PipelineEvent;
use crate::item::Item;
use crate::types::BatchNumber;

/// A pluggable, potentially failing, potentially slow per-item operation.
///
/// Transforms are the only suspension points of the pipeline (network I/O,
/// tool invocations, model inference); the scheduler itself performs no
/// blocking work. Implementations should be stateless apart from their
/// injected capabilities and must be safe to run concurrently across items.
///
/// # Error Handling
///
/// An `Err` from [`apply`](Transform::apply) is an item-scoped failure: the
/// scheduler downgrades it to an absence-marker result annotated with the
/// failure's nature. It never aborts the batch.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use trackmill::item::Item;
/// use trackmill::transform::{Transform, TransformContext, TransformError};
///
/// struct TitleCaser;
///
/// #[async_trait]
/// impl Transform for TitleCaser {
///     fn outcome_field(&self) -> &'static str {
///         "title_upper"
///     }
///
///     async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
///         let title = item
///             .title
///             .as_deref()
///             .ok_or(TransformError::MissingField { what: "title" })?;
///         Ok(json!(title.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transform: Send + Sync {
    /// JSON key the outcome is stored under in checkpoint records.
    fn outcome_field(&self) -> &'static str;

    /// Apply this transform to one item.
    async fn apply(&self, item: &Item, ctx: TransformContext) -> Result<Value, TransformError>;
}

/// Execution context passed to transforms.
///
/// Carries the batch the item runs in and a channel for emitting progress
/// events; transforms never touch the checkpoint directly.
#[derive(Clone, Debug)]
pub struct TransformContext {
    /// One-based number of the batch this item belongs to.
    pub batch: BatchNumber,
    /// Channel into the run's event bus.
    pub event_sender: flume::Sender<PipelineEvent>,
}

impl TransformContext {
    /// Emit a progress event for this item.
    pub fn emit(&self, event: PipelineEvent) -> Result<(), TransformContextError> {
        self.event_sender
            .send(event)
            .map_err(|_| TransformContextError::EventBusUnavailable)
    }
}

/// Errors that can occur when using [`TransformContext`] methods.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformContextError {
    /// Event could not be sent because the bus is disconnected.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(trackmill::transform::event_bus_unavailable),
        help("The event bus listener may have shut down before the run finished.")
    )]
    EventBusUnavailable,
}

/// Item-scoped transform failures.
///
/// All variants are recoverable at the batch level: the scheduler converts
/// them into absence markers and carries on with the rest of the batch.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformError {
    /// The item lacks a field this transform needs (e.g. a source URL).
    #[error("missing required field: {what}")]
    #[diagnostic(
        code(trackmill::transform::missing_field),
        help("Check that the previous pipeline stage produced the required data.")
    )]
    MissingField { what: &'static str },

    /// A file the transform expected is not on disk.
    #[error("file not found: {path}")]
    #[diagnostic(code(trackmill::transform::file_not_found))]
    FileNotFound { path: PathBuf },

    /// An external tool exited unsuccessfully.
    #[error("{tool} failed: {message}")]
    #[diagnostic(code(trackmill::transform::tool))]
    Tool { tool: &'static str, message: String },

    /// The embedding model failed for the whole item.
    #[error(transparent)]
    #[diagnostic(code(trackmill::transform::model))]
    Model(#[from] crate::model::ModelError),

    /// Audio could not be loaded or decoded.
    #[error(transparent)]
    #[diagnostic(code(trackmill::transform::audio))]
    Audio(#[from] crate::audio::AudioError),

    /// No segment of the input survived filtering or inference.
    #[error("no viable segments: input too short or all segment inference failed")]
    #[diagnostic(code(trackmill::transform::no_viable_segments))]
    NoViableSegments,

    /// Surviving segment vectors disagreed on dimensionality.
    #[error(transparent)]
    #[diagnostic(code(trackmill::transform::aggregate))]
    Aggregate(#[from] crate::segment::AggregateError),

    /// The upload collaborator failed.
    #[error("upload failed: {message}")]
    #[diagnostic(code(trackmill::transform::upload))]
    Upload { message: String },

    #[error(transparent)]
    #[diagnostic(code(trackmill::transform::io))]
    Io(#[from] std::io::Error),
}
