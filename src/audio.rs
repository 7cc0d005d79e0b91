//! Normalized audio clips and the decoding boundary.
//!
//! Decoding and resampling internals are outside this crate; the
//! [`AudioSource`] capability hands the pipeline an [`AudioClip`] that is
//! already mono at [`TARGET_SAMPLE_RATE`]. Normalization must happen before
//! segment boundaries are computed so all segment durations are measured in
//! the same time base.

use async_trait::async_trait;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sample rate every clip is normalized to before segmentation, in Hz.
pub const TARGET_SAMPLE_RATE: u32 = 48_000;

/// A mono audio clip at a fixed sample rate.
///
/// Invariant: `samples` is a single channel at `sample_rate`. Clips are
/// ephemeral: they exist only while one item's embedding is computed.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap already-normalized mono samples.
    #[must_use]
    pub fn from_mono_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A silent clip of the given duration, mono at [`TARGET_SAMPLE_RATE`].
    /// Mostly useful in tests and demos.
    #[must_use]
    pub fn silent(duration_secs: f64) -> Self {
        let len = (duration_secs * f64::from(TARGET_SAMPLE_RATE)).round() as usize;
        Self::from_mono_samples(vec![0.0; len], TARGET_SAMPLE_RATE)
    }

    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Borrow the sample range `[start, start + len)` as a segment view.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the clip; callers derive ranges from
    /// [`Segmenter::plan`](crate::segment::Segmenter::plan), which never
    /// produces an out-of-bounds segment.
    #[must_use]
    pub fn segment(&self, start: usize, len: usize) -> AudioSegmentView<'_> {
        AudioSegmentView {
            samples: &self.samples[start..start + len],
            sample_rate: self.sample_rate,
            start,
        }
    }
}

/// Borrowed view of one bounded-duration slice of a clip.
#[derive(Clone, Copy, Debug)]
pub struct AudioSegmentView<'a> {
    pub samples: &'a [f32],
    pub sample_rate: u32,
    /// Offset of the first sample within the source clip.
    pub start: usize,
}

impl AudioSegmentView<'_> {
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Errors produced at the decoding boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum AudioError {
    #[error("audio file not found: {path}")]
    #[diagnostic(code(trackmill::audio::not_found))]
    NotFound { path: PathBuf },

    #[error("failed to decode {path}: {message}")]
    #[diagnostic(
        code(trackmill::audio::decode),
        help("Check that the file is a supported audio format and not truncated.")
    )]
    Decode { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(code(trackmill::audio::io))]
    Io(#[from] std::io::Error),
}

/// Capability that loads an audio file into a normalized clip.
///
/// Implementations own decoding and resampling; the returned clip must be
/// mono at [`TARGET_SAMPLE_RATE`]. Constructed once per process and passed
/// explicitly, never as ambient state.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn load(&self, path: &Path) -> Result<AudioClip, AudioError>;
}
