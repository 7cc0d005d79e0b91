//! Pipeline configuration and validation.
//!
//! All knobs are plain values consumed at construction time. Validation is
//! fatal and happens before any item is processed: a bad batch size is a
//! startup error, never something discovered mid-run.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::segment::{DEFAULT_MIN_SEGMENT_SECS, DEFAULT_SEGMENT_SECS, Segmenter};

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    #[diagnostic(code(trackmill::config::batch_size))]
    ZeroBatchSize,

    #[error("worker count must be at least 1")]
    #[diagnostic(code(trackmill::config::worker_count))]
    ZeroWorkerCount,

    #[error("flush attempts must be at least 1")]
    #[diagnostic(code(trackmill::config::flush_attempts))]
    ZeroFlushAttempts,

    #[error("segment duration must be positive, got {secs}")]
    #[diagnostic(code(trackmill::config::segment_duration))]
    NonPositiveSegmentDuration { secs: f64 },

    #[error("minimum segment duration must be positive, got {secs}")]
    #[diagnostic(code(trackmill::config::min_segment_duration))]
    NonPositiveMinSegmentDuration { secs: f64 },

    #[error("minimum segment duration {min_secs} exceeds segment duration {segment_secs}")]
    #[diagnostic(
        code(trackmill::config::min_exceeds_segment),
        help("Every segment would be discarded; lower the minimum or raise the segment duration.")
    )]
    MinExceedsSegmentDuration { min_secs: f64, segment_secs: f64 },

    #[error("{which} path is empty")]
    #[diagnostic(code(trackmill::config::empty_path))]
    EmptyPath { which: &'static str },

    #[error("environment variable {var} has invalid value {value:?}")]
    #[diagnostic(code(trackmill::config::invalid_env))]
    InvalidEnv { var: &'static str, value: String },
}

/// The pipeline's configuration surface.
///
/// Defaults mirror a small-catalog enrichment run: batches of 10, four
/// workers, 30-second segments with a 5-second viability floor.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Path to the JSON work list.
    pub work_list: PathBuf,
    /// Path to the checkpoint file.
    pub checkpoint: PathBuf,
    /// Directory downloaded audio is written into.
    pub output_dir: PathBuf,
    /// Items per batch; the checkpoint is flushed at every batch boundary.
    pub batch_size: usize,
    /// Bound on concurrently running transform calls within a batch.
    pub worker_count: usize,
    /// Segment duration for embedding, in seconds.
    pub segment_secs: f64,
    /// Minimum viable segment duration, in seconds.
    pub min_segment_secs: f64,
    /// Checkpoint flush attempts before the run halts.
    pub flush_attempts: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_list: PathBuf::from("work_list.json"),
            checkpoint: PathBuf::from("checkpoint.json"),
            output_dir: PathBuf::from("downloads"),
            batch_size: 10,
            worker_count: 4,
            segment_secs: DEFAULT_SEGMENT_SECS,
            min_segment_secs: DEFAULT_MIN_SEGMENT_SECS,
            flush_attempts: 3,
        }
    }
}

impl PipelineConfig {
    /// Resolve configuration from `TRACKMILL_*` environment variables,
    /// falling back to defaults. A `.env` file is honored when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(value) = std::env::var("TRACKMILL_WORK_LIST") {
            config.work_list = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("TRACKMILL_CHECKPOINT") {
            config.checkpoint = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("TRACKMILL_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(value);
        }
        config.batch_size = parse_env("TRACKMILL_BATCH_SIZE", config.batch_size)?;
        config.worker_count = parse_env("TRACKMILL_WORKER_COUNT", config.worker_count)?;
        config.segment_secs = parse_env("TRACKMILL_SEGMENT_SECS", config.segment_secs)?;
        config.min_segment_secs =
            parse_env("TRACKMILL_MIN_SEGMENT_SECS", config.min_segment_secs)?;
        config.flush_attempts = parse_env("TRACKMILL_FLUSH_ATTEMPTS", config.flush_attempts)?;

        config.validate()?;
        Ok(config)
    }

    /// Check every invariant; called by the runner and scheduler before
    /// any work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkerCount);
        }
        if self.flush_attempts == 0 {
            return Err(ConfigError::ZeroFlushAttempts);
        }
        if self.segment_secs <= 0.0 {
            return Err(ConfigError::NonPositiveSegmentDuration {
                secs: self.segment_secs,
            });
        }
        if self.min_segment_secs <= 0.0 {
            return Err(ConfigError::NonPositiveMinSegmentDuration {
                secs: self.min_segment_secs,
            });
        }
        if self.min_segment_secs > self.segment_secs {
            return Err(ConfigError::MinExceedsSegmentDuration {
                min_secs: self.min_segment_secs,
                segment_secs: self.segment_secs,
            });
        }
        if self.work_list.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { which: "work list" });
        }
        if self.checkpoint.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath {
                which: "checkpoint",
            });
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath {
                which: "output directory",
            });
        }
        Ok(())
    }

    /// The segmenter this configuration describes.
    #[must_use]
    pub fn segmenter(&self) -> Segmenter {
        Segmenter::new(self.segment_secs, self.min_segment_secs)
    }

    #[must_use]
    pub fn with_work_list(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_list = path.into();
        self
    }

    #[must_use]
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = path.into();
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = PipelineConfig::default().with_batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroBatchSize)
        ));
    }

    #[test]
    fn min_above_segment_duration_is_rejected() {
        let mut config = PipelineConfig::default();
        config.min_segment_secs = 40.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MinExceedsSegmentDuration { .. })
        ));
    }
}
