//! Upload transform: push an item's local file to remote storage.
//!
//! The storage SDK is a black box behind the [`Uploader`] capability: local
//! path in, remote URL out. One call per item; retry beyond what the batch
//! scheduler already provides is deliberately not layered on here.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::item::Item;
use crate::transform::{Transform, TransformContext, TransformError};

/// Errors produced by an uploader backend for a single file.
#[derive(Debug, Error, Diagnostic)]
pub enum UploadError {
    #[error("storage rejected {path}: {message}")]
    #[diagnostic(code(trackmill::upload::rejected))]
    Rejected { path: String, message: String },

    #[error("storage unreachable: {message}")]
    #[diagnostic(
        code(trackmill::upload::unreachable),
        help("Check credentials and network connectivity to the storage service.")
    )]
    Unreachable { message: String },
}

/// Capability that stores a local file remotely and returns its URL.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, local: &Path) -> Result<String, UploadError>;
}

/// Transform that uploads one item's local file.
pub struct UploadTransform {
    uploader: Arc<dyn Uploader>,
}

impl UploadTransform {
    #[must_use]
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self { uploader }
    }
}

#[async_trait]
impl Transform for UploadTransform {
    fn outcome_field(&self) -> &'static str {
        "remote_url"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        let path = item
            .local_path
            .as_deref()
            .ok_or(TransformError::MissingField { what: "local_path" })?;

        if !tokio::fs::try_exists(path).await? {
            return Err(TransformError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        info!(id = %item.id, path = %path.display(), "uploading");
        let url = self
            .uploader
            .upload(path)
            .await
            .map_err(|err| TransformError::Upload {
                message: err.to_string(),
            })?;

        Ok(json!(url))
    }
}
