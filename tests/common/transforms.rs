use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use trackmill::item::Item;
use trackmill::runtime::{Checkpoint, Checkpointer, CheckpointerError, InMemoryCheckpointer};
use trackmill::transform::{Transform, TransformContext, TransformError};

/// Transform that records which items it was applied to and succeeds with
/// a value derived from the item id.
pub struct RecordingTransform {
    pub applied: Mutex<Vec<String>>,
}

impl RecordingTransform {
    pub fn new() -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn applied_ids(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transform for RecordingTransform {
    fn outcome_field(&self) -> &'static str {
        "local_path"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        self.applied.lock().unwrap().push(item.id.to_string());
        Ok(json!(format!("/audio/{}.mp3", item.id)))
    }
}

/// Transform that fails for a chosen set of item ids and succeeds for the
/// rest.
pub struct FailForTransform {
    fail_ids: HashSet<String>,
}

impl FailForTransform {
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(fail_ids: I) -> Self {
        Self {
            fail_ids: fail_ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Transform for FailForTransform {
    fn outcome_field(&self) -> &'static str {
        "local_path"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        if self.fail_ids.contains(item.id.as_str()) {
            return Err(TransformError::Tool {
                tool: "fake-tool",
                message: "simulated crash".to_string(),
            });
        }
        Ok(json!(format!("/audio/{}.mp3", item.id)))
    }
}

/// Transform that panics for a chosen set of item ids.
pub struct PanickingTransform {
    panic_ids: HashSet<String>,
}

impl PanickingTransform {
    pub fn new<I: IntoIterator<Item = S>, S: Into<String>>(panic_ids: I) -> Self {
        Self {
            panic_ids: panic_ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Transform for PanickingTransform {
    fn outcome_field(&self) -> &'static str {
        "local_path"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        assert!(
            !self.panic_ids.contains(item.id.as_str()),
            "induced worker panic"
        );
        Ok(json!(format!("/audio/{}.mp3", item.id)))
    }
}

/// Transform that sleeps briefly and tracks the peak number of concurrent
/// executions, to verify the worker-pool bound.
pub struct ConcurrencyProbeTransform {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbeTransform {
    pub fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transform for ConcurrencyProbeTransform {
    fn outcome_field(&self) -> &'static str {
        "local_path"
    }

    async fn apply(&self, item: &Item, _ctx: TransformContext) -> Result<Value, TransformError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(json!(format!("/audio/{}.mp3", item.id)))
    }
}

/// Checkpointer that fails its first `failures` flushes, then delegates to
/// an in-memory backend.
pub struct FlakyCheckpointer {
    remaining_failures: AtomicU32,
    pub inner: InMemoryCheckpointer,
    pub flush_calls: AtomicU32,
}

impl FlakyCheckpointer {
    pub fn failing(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
            inner: InMemoryCheckpointer::new(),
            flush_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Checkpointer for FlakyCheckpointer {
    async fn flush(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointerError> {
        self.flush_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CheckpointerError::Backend {
                message: "simulated disk full".to_string(),
            });
        }
        self.inner.flush(checkpoint).await
    }

    async fn load(&self, outcome_field: &str) -> Result<Option<Checkpoint>, CheckpointerError> {
        self.inner.load(outcome_field).await
    }
}
