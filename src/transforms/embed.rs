//! Embedding transform: turn an item's local audio file into one
//! fixed-size vector.
//!
//! Long inputs go through the [`Segmenter`]: fixed-duration segments, one
//! model call per segment, element-wise mean across survivors. The audio
//! decoder and the model are injected capabilities constructed once per
//! process.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::audio::AudioSource;
use crate::item::Item;
use crate::model::{EmbeddingModel, ModelError};
use crate::segment::Segmenter;
use crate::transform::{Transform, TransformContext, TransformError};

/// Transform that computes an aggregate embedding for one item's audio file.
pub struct EmbedTransform {
    source: Arc<dyn AudioSource>,
    model: Arc<dyn EmbeddingModel>,
    segmenter: Segmenter,
}

impl EmbedTransform {
    #[must_use]
    pub fn new(
        source: Arc<dyn AudioSource>,
        model: Arc<dyn EmbeddingModel>,
        segmenter: Segmenter,
    ) -> Self {
        Self {
            source,
            model,
            segmenter,
        }
    }
}

#[async_trait]
impl Transform for EmbedTransform {
    fn outcome_field(&self) -> &'static str {
        "embedding"
    }

    async fn apply(&self, item: &Item, ctx: TransformContext) -> Result<Value, TransformError> {
        let path = item
            .local_path
            .as_deref()
            .ok_or(TransformError::MissingField { what: "local_path" })?;

        if !tokio::fs::try_exists(path).await? {
            return Err(TransformError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let clip = self.source.load(path).await?;
        info!(
            id = %item.id,
            duration_secs = clip.duration_secs(),
            "embedding audio"
        );

        let aggregate = self.segmenter.embed(&clip, self.model.as_ref()).await?;

        if aggregate.segments_dropped > 0 {
            // Observability only; a disconnected bus must not fail the item.
            let _ = ctx.emit(crate::event_bus::PipelineEvent::SegmentsDropped {
                id: item.id.clone(),
                dropped: aggregate.segments_dropped,
                embedded: aggregate.segments_embedded,
            });
        }

        match aggregate.vector {
            Some(vector) => Ok(json!(vector)),
            None => Err(TransformError::NoViableSegments),
        }
    }
}

/// Embed a free-text query into the model's vector space.
///
/// The search-side counterpart of [`EmbedTransform`]: catalog embeddings and
/// query embeddings must come from the same model to be comparable.
pub async fn embed_query(
    model: &dyn EmbeddingModel,
    query: &str,
) -> Result<Vec<f32>, ModelError> {
    model.embed_text(query).await
}
