//! Real download pipeline wired to `yt-dlp`.
//!
//! Reads `TRACKMILL_*` configuration from the environment (or `.env`),
//! expects the work list to be a JSON array of song records with `id`,
//! `title`, `artist`, and `source_url` fields, and resumes from the
//! checkpoint file if one exists.
//!
//! ```bash
//! TRACKMILL_WORK_LIST=youtube_matches.json \
//! TRACKMILL_CHECKPOINT=songs_with_audio.json \
//! TRACKMILL_OUTPUT_DIR=downloads \
//! cargo run --example catalog_run
//! ```

use std::sync::Arc;

use trackmill::runtime::{PipelineConfig, PipelineRunner};
use trackmill::transforms::{DownloadTransform, YtDlpFetcher};

#[tokio::main]
async fn main() -> miette::Result<()> {
    trackmill::telemetry::init();

    let config = PipelineConfig::from_env()?;
    let transform = Arc::new(DownloadTransform::new(
        Arc::new(YtDlpFetcher::new()),
        &config.output_dir,
    ));

    let runner = PipelineRunner::new(config)?;
    let report = runner.run(transform).await?;

    println!(
        "done: {} downloaded, {} failed, {} batches flushed",
        report.succeeded, report.failed, report.batches
    );
    Ok(())
}
