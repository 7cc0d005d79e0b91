//! End-to-end runs through the public runner: fresh start, partial
//! failure, and idempotent resume against a durable checkpoint file.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FailForTransform, RecordingTransform, make_items};
use trackmill::event_bus::{EventBus, MemorySink, PipelineEvent};
use trackmill::runtime::{
    Checkpointer, ConfigError, JsonCheckpointer, PipelineConfig, PipelineRunner, RunnerError,
};
use trackmill::store::ItemStore;

async fn write_work_list(path: &std::path::Path, items: &[trackmill::item::Item]) {
    let body = serde_json::to_string_pretty(items).unwrap();
    tokio::fs::write(path, body).await.unwrap();
}

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_work_list(dir.join("work_list.json"))
        .with_checkpoint(dir.join("checkpoint.json"))
        .with_output_dir(dir.join("downloads"))
        .with_batch_size(2)
        .with_worker_count(2)
}

#[tokio::test]
async fn fresh_run_processes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let items = make_items(5);
    write_work_list(&dir.path().join("work_list.json"), &items).await;

    let runner = PipelineRunner::new(config_in(dir.path())).unwrap();
    let transform = Arc::new(RecordingTransform::new());
    let report = runner.run(transform.clone()).await.unwrap();

    assert_eq!(report.processed, 5);
    assert_eq!(report.succeeded, 5);
    assert_eq!(report.batches, 3);
    assert_eq!(transform.applied_ids().len(), 5);
}

#[tokio::test]
async fn resume_skips_checkpointed_work() {
    let dir = tempfile::tempdir().unwrap();
    let items = make_items(6);
    write_work_list(&dir.path().join("work_list.json"), &items).await;

    // First run: t2 fails, everything else succeeds.
    let first_runner = PipelineRunner::new(config_in(dir.path())).unwrap();
    let first = first_runner
        .run(Arc::new(FailForTransform::new(["t2"])))
        .await
        .unwrap();
    assert_eq!(first.succeeded, 5);
    assert_eq!(first.failed, 1);

    // Second run over the same work list: every id (including the
    // explicitly failed one; absence is terminal) is already recorded.
    let second_runner = PipelineRunner::new(config_in(dir.path())).unwrap();
    let transform = Arc::new(RecordingTransform::new());
    let second = second_runner.run(transform.clone()).await.unwrap();

    assert_eq!(second.processed, 0);
    assert!(transform.applied_ids().is_empty());
}

#[tokio::test]
async fn resume_after_interruption_does_not_redo_durable_work() {
    let dir = tempfile::tempdir().unwrap();
    let items = make_items(6);
    write_work_list(&dir.path().join("work_list.json"), &items).await;
    let config = config_in(dir.path());

    // Simulate an interrupted run: only the first two batches' worth of
    // items made it into the durable checkpoint.
    let interrupted = PipelineRunner::new(config.clone()).unwrap();
    let store = ItemStore::from_items(items[..4].to_vec());
    interrupted
        .run_with_store(&store, Arc::new(RecordingTransform::new()))
        .await
        .unwrap();

    // Resume against the full work list.
    let resumed = PipelineRunner::new(config).unwrap();
    let transform = Arc::new(RecordingTransform::new());
    let report = resumed.run(transform.clone()).await.unwrap();

    assert_eq!(report.processed, 2);
    let mut applied = transform.applied_ids();
    applied.sort();
    assert_eq!(applied, vec!["t5", "t6"]);

    // No regression: everything previously durable is still there.
    let checkpointer = JsonCheckpointer::new(dir.path().join("checkpoint.json"));
    let durable = checkpointer.load("local_path").await.unwrap().unwrap();
    assert_eq!(durable.len(), 6);
    assert_eq!(durable.succeeded(), 6);
}

#[tokio::test]
async fn invalid_config_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path()).with_batch_size(0);
    let err = PipelineRunner::new(config)
        .err()
        .expect("zero batch size must be rejected");
    assert!(matches!(
        err,
        RunnerError::Config(ConfigError::ZeroBatchSize)
    ));
}

#[tokio::test]
async fn lifecycle_events_reach_the_sink() {
    let dir = tempfile::tempdir().unwrap();
    let items = make_items(3);
    write_work_list(&dir.path().join("work_list.json"), &items).await;

    let sink = MemorySink::new();
    let runner = PipelineRunner::new(config_in(dir.path()))
        .unwrap()
        .with_event_bus(EventBus::with_sink(sink.clone()));
    runner
        .run(Arc::new(RecordingTransform::new()))
        .await
        .unwrap();

    // The bus listener drains asynchronously; wait for the terminal event.
    let events = {
        let mut snapshot = sink.snapshot();
        for _ in 0..50 {
            if snapshot
                .iter()
                .any(|event| matches!(event, PipelineEvent::RunCompleted { .. }))
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            snapshot = sink.snapshot();
        }
        snapshot
    };

    assert!(matches!(events.first(), Some(PipelineEvent::RunStarted { pending: 3, .. })));
    let completed = events
        .iter()
        .filter(|event| matches!(event, PipelineEvent::ItemCompleted { .. }))
        .count();
    assert_eq!(completed, 3);
    let flushes = events
        .iter()
        .filter(|event| matches!(event, PipelineEvent::BatchFlushed { .. }))
        .count();
    assert_eq!(flushes, 2); // batches of 2 + 1
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::RunCompleted { succeeded: 3, failed: 0, .. })
    ));
}
