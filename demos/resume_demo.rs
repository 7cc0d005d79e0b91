//! Self-contained resume demonstration: run a batch pipeline twice over
//! the same work list and watch the second run skip everything the first
//! one checkpointed.
//!
//! ```bash
//! cargo run --example resume_demo
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use trackmill::item::Item;
use trackmill::runtime::{PipelineConfig, PipelineRunner};
use trackmill::store::ItemStore;
use trackmill::transform::{Transform, TransformContext, TransformError};

/// Stand-in for a slow external tool: fails on one unlucky item.
struct FakeDownloader;

#[async_trait]
impl Transform for FakeDownloader {
    fn outcome_field(&self) -> &'static str {
        "local_path"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        if item.id.as_str() == "t4" {
            return Err(TransformError::Tool {
                tool: "fake-downloader",
                message: "simulated network failure".to_string(),
            });
        }
        Ok(json!(format!("/tmp/audio/{}.mp3", item.id)))
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    trackmill::telemetry::init();

    let dir = std::env::temp_dir().join("trackmill-resume-demo");
    tokio::fs::create_dir_all(&dir).await.expect("temp dir");
    // Start clean; a checkpoint left by a previous demo invocation would
    // make the "fresh" run skip everything.
    let _ = tokio::fs::remove_file(dir.join("checkpoint.json")).await;

    let items: Vec<Item> = (1..=9)
        .map(|i| {
            Item::new(format!("t{i}"))
                .with_title(format!("Track {i}"))
                .with_artist("Demo Band")
        })
        .collect();
    let store = ItemStore::from_items(items);

    let config = PipelineConfig::default()
        .with_checkpoint(dir.join("checkpoint.json"))
        .with_output_dir(&dir)
        .with_batch_size(3)
        .with_worker_count(2);

    println!("--- first run (fresh) ---");
    let runner = PipelineRunner::new(config.clone())?;
    let report = runner
        .run_with_store(&store, Arc::new(FakeDownloader))
        .await?;
    println!(
        "first run: {} succeeded, {} failed over {} batches",
        report.succeeded, report.failed, report.batches
    );

    println!("--- second run (resumed) ---");
    let runner = PipelineRunner::new(config)?;
    let report = runner
        .run_with_store(&store, Arc::new(FakeDownloader))
        .await?;
    println!(
        "second run: {} items needed processing",
        report.processed
    );
    println!("checkpoint: {}", dir.join("checkpoint.json").display());
    Ok(())
}
