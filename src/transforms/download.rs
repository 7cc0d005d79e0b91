//! Download transform: resolve an item's source URL to a local audio file.
//!
//! The actual downloader is an injected [`AudioFetcher`] capability;
//! [`YtDlpFetcher`] shells out to the `yt-dlp` tool. File naming is
//! deterministic from the item's artist/title (path separators sanitized),
//! and an already-present file short-circuits to success without invoking
//! the tool, which is what makes interrupted runs cheap to resume.

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::item::Item;
use crate::transform::{Transform, TransformContext, TransformError};

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Errors produced by a fetcher backend for a single download.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("failed to launch {tool}: {source}")]
    #[diagnostic(
        code(trackmill::fetch::launch),
        help("Is the download tool installed and on PATH?")
    )]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}")]
    #[diagnostic(code(trackmill::fetch::non_zero_exit))]
    NonZeroExit {
        tool: &'static str,
        status: ExitStatus,
    },
}

/// Capability that materializes a URL as a local audio file.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Tool name, used in error reports and logs.
    fn tool_name(&self) -> &'static str;

    /// Download `url` to `dest`. `dest`'s parent directory already exists.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// [`AudioFetcher`] backed by the `yt-dlp` command-line tool.
///
/// Extracts audio as mp3 directly to the destination path. Tool output is
/// discarded; only the exit status matters.
#[derive(Clone, Debug, Default)]
pub struct YtDlpFetcher {
    binary: Option<PathBuf>,
}

impl YtDlpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit binary path instead of resolving `yt-dlp` from PATH.
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }
}

#[async_trait]
impl AudioFetcher for YtDlpFetcher {
    fn tool_name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let program = self
            .binary
            .clone()
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));
        let status = Command::new(program)
            .arg("-x")
            .args(["--audio-format", "mp3"])
            .arg("-o")
            .arg(dest)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| FetchError::Launch {
                tool: self.tool_name(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(FetchError::NonZeroExit {
                tool: self.tool_name(),
                status,
            })
        }
    }
}

/// Derive the sanitized file stem `"{artist} - {title}"` for an item.
///
/// Path separators in either field are replaced with `_` so the stem can
/// never escape the output directory.
#[must_use]
pub fn safe_file_stem(artist: &str, title: &str) -> String {
    format!("{artist} - {title}").replace(['/', '\\'], "_")
}

/// Transform that downloads one item's source URL into the output directory.
pub struct DownloadTransform {
    fetcher: Arc<dyn AudioFetcher>,
    output_dir: PathBuf,
}

impl DownloadTransform {
    #[must_use]
    pub fn new(fetcher: Arc<dyn AudioFetcher>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            output_dir: output_dir.into(),
        }
    }

    /// The deterministic destination path for an item.
    #[must_use]
    pub fn destination(&self, item: &Item) -> PathBuf {
        let artist = item.artist.as_deref().unwrap_or(UNKNOWN_ARTIST);
        let title = item.title.as_deref().unwrap_or(UNKNOWN_TITLE);
        self.output_dir
            .join(format!("{}.mp3", safe_file_stem(artist, title)))
    }
}

#[async_trait]
impl Transform for DownloadTransform {
    fn outcome_field(&self) -> &'static str {
        "local_path"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        let dest = self.destination(item);

        // Idempotent skip: a file from an earlier (possibly interrupted)
        // run counts as done without re-invoking the tool.
        if tokio::fs::try_exists(&dest).await? {
            debug!(id = %item.id, path = %dest.display(), "already downloaded, skipping");
            return Ok(json!(std::path::absolute(&dest)?));
        }

        let url = item
            .source_url
            .as_deref()
            .ok_or(TransformError::MissingField { what: "source_url" })?;

        tokio::fs::create_dir_all(&self.output_dir).await?;

        info!(id = %item.id, url, path = %dest.display(), "downloading");
        self.fetcher
            .fetch(url, &dest)
            .await
            .map_err(|err| TransformError::Tool {
                tool: self.fetcher.tool_name(),
                message: err.to_string(),
            })?;

        Ok(json!(std::path::absolute(&dest)?))
    }
}
