//! The embedding model capability.
//!
//! The model is a black box: audio segment in, fixed-size vector out (and
//! likewise for text queries). It is loaded once per process with an explicit
//! initialization point and passed as an `Arc<dyn EmbeddingModel>`, never
//! reinitialized implicitly, never reached through ambient global state.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::audio::AudioSegmentView;

/// Errors surfaced by a model backend for a single inference call.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("model inference failed: {message}")]
    #[diagnostic(code(trackmill::model::inference))]
    Inference { message: String },

    #[error("model backend unavailable: {message}")]
    #[diagnostic(
        code(trackmill::model::unavailable),
        help("Check that the model process/runtime was started and is reachable.")
    )]
    Unavailable { message: String },
}

impl ModelError {
    #[must_use]
    pub fn inference(message: impl Into<String>) -> Self {
        ModelError::Inference {
            message: message.into(),
        }
    }
}

/// Audio/text embedding model, injected wherever embeddings are computed.
///
/// Both methods return a vector of the model's fixed dimensionality; the
/// aggregation layer treats a dimensionality drift between calls as a fatal
/// misconfiguration for the item being processed.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed one audio segment.
    async fn embed_audio(&self, segment: AudioSegmentView<'_>) -> Result<Vec<f32>, ModelError>;

    /// Embed a text query into the same vector space.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ModelError>;
}
