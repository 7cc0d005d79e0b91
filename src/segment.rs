//! Segmentation and aggregation of long audio inputs.
//!
//! A variable-length clip is sliced into fixed-duration segments, the
//! embedding model runs over each segment independently, and the surviving
//! per-segment vectors are combined into one element-wise mean. One
//! segment's inference failure drops that segment from the mean rather than
//! aborting the whole item: the same partial-failure philosophy the batch
//! scheduler applies per item, at finer grain.

use miette::Diagnostic;
use thiserror::Error;
use tracing::warn;

use crate::audio::AudioClip;
use crate::model::EmbeddingModel;

/// Default segment length, in seconds.
pub const DEFAULT_SEGMENT_SECS: f64 = 30.0;

/// Default minimum viable segment length, in seconds. A final partial
/// segment shorter than this floor is discarded, never padded or embedded.
pub const DEFAULT_MIN_SEGMENT_SECS: f64 = 5.0;

/// A bounded-duration slice of one clip, expressed in samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Offset of the first sample.
    pub start: usize,
    /// Number of samples.
    pub len: usize,
}

/// Lazy, finite, restartable sequence of [`Segment`]s over one clip.
///
/// Yields `[0, d), [d, 2d), …` until the clip is exhausted; the final
/// partial segment is yielded only when it reaches the minimum floor
/// (a segment of exactly the floor is kept). Cloning restarts the plan.
#[derive(Clone, Debug)]
pub struct SegmentPlan {
    total: usize,
    segment_len: usize,
    min_len: usize,
    next_start: usize,
}

impl Iterator for SegmentPlan {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        while self.next_start < self.total {
            let start = self.next_start;
            let len = self.segment_len.min(self.total - start);
            self.next_start = start + self.segment_len;
            if len >= self.min_len {
                return Some(Segment { start, len });
            }
            // Shorter than the viability floor: discarded, not padded.
        }
        None
    }
}

/// Fatal aggregation errors for one item.
///
/// A dimensionality drift between surviving segment vectors indicates a
/// misconfigured model, not bad input; the caller converts it into an
/// absence marker for the item.
#[derive(Debug, Error, Diagnostic)]
pub enum AggregateError {
    #[error("segment {segment} produced a {actual}-dim vector, expected {expected}")]
    #[diagnostic(
        code(trackmill::segment::dimension_mismatch),
        help("All vectors from one model must share a dimensionality; check the model configuration.")
    )]
    DimensionMismatch {
        segment: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result of aggregating one clip.
///
/// `vector` is `None` (the absence marker) when zero segments survived,
/// either because the input was shorter than the viability floor or because
/// every inference call failed. A zero vector is a valid embedding and is
/// never used to stand in for absence.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    pub vector: Option<Vec<f32>>,
    pub segments_embedded: usize,
    pub segments_dropped: usize,
}

/// Splits a clip into fixed-duration segments and averages their embeddings.
#[derive(Clone, Copy, Debug)]
pub struct Segmenter {
    segment_secs: f64,
    min_secs: f64,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_SECS, DEFAULT_MIN_SEGMENT_SECS)
    }
}

impl Segmenter {
    /// Create a segmenter with the given segment duration and minimum
    /// viable duration, both in seconds. Values are validated by
    /// [`PipelineConfig`](crate::runtime::PipelineConfig) before a run
    /// starts; this constructor itself does not reject them.
    #[must_use]
    pub fn new(segment_secs: f64, min_secs: f64) -> Self {
        Self {
            segment_secs,
            min_secs,
        }
    }

    #[must_use]
    pub fn segment_secs(&self) -> f64 {
        self.segment_secs
    }

    #[must_use]
    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    /// Plan the segmentation of `clip` without touching its samples.
    #[must_use]
    pub fn plan(&self, clip: &AudioClip) -> SegmentPlan {
        let rate = f64::from(clip.sample_rate());
        SegmentPlan {
            total: clip.len(),
            segment_len: (self.segment_secs * rate).round() as usize,
            min_len: (self.min_secs * rate).round() as usize,
            next_start: 0,
        }
    }

    /// Embed every viable segment of `clip` and mean the survivors.
    ///
    /// A single segment's inference failure is logged and that segment is
    /// excluded from the mean; only a dimensionality mismatch is fatal.
    /// Zero survivors yield `vector: None`.
    pub async fn embed(
        &self,
        clip: &AudioClip,
        model: &dyn EmbeddingModel,
    ) -> Result<Aggregate, AggregateError> {
        let mut sums: Vec<f64> = Vec::new();
        let mut embedded = 0usize;
        let mut dropped = 0usize;

        for (index, segment) in self.plan(clip).enumerate() {
            let view = clip.segment(segment.start, segment.len);
            match model.embed_audio(view).await {
                Ok(vector) => {
                    if embedded == 0 {
                        sums = vec![0.0; vector.len()];
                    } else if vector.len() != sums.len() {
                        return Err(AggregateError::DimensionMismatch {
                            segment: index,
                            expected: sums.len(),
                            actual: vector.len(),
                        });
                    }
                    for (sum, component) in sums.iter_mut().zip(&vector) {
                        *sum += f64::from(*component);
                    }
                    embedded += 1;
                }
                Err(err) => {
                    warn!(
                        segment = index,
                        start = segment.start,
                        error = %err,
                        "segment inference failed; excluding from mean"
                    );
                    dropped += 1;
                }
            }
        }

        let vector = (embedded > 0).then(|| {
            let n = embedded as f64;
            sums.iter().map(|sum| (sum / n) as f32).collect()
        });

        Ok(Aggregate {
            vector,
            segments_embedded: embedded,
            segments_dropped: dropped,
        })
    }
}
