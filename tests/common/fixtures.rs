use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use trackmill::audio::{AudioClip, AudioError, AudioSegmentView, AudioSource, TARGET_SAMPLE_RATE};
use trackmill::item::Item;
use trackmill::model::{EmbeddingModel, ModelError};

/// Items `t1..=tn`, each with a title, artist, and source URL.
pub fn make_items(n: usize) -> Vec<Item> {
    (1..=n)
        .map(|i| {
            Item::new(format!("t{i}"))
                .with_title(format!("Track {i}"))
                .with_artist("Fixture Band")
                .with_source_url(format!("https://example.com/watch?v={i}"))
        })
        .collect()
}

/// A clip of the given duration, mono at the target rate.
pub fn clip_secs(duration_secs: f64) -> AudioClip {
    AudioClip::silent(duration_secs)
}

/// A low-sample-rate clip for plan-only tests where allocating minutes of
/// 48 kHz audio would be wasteful.
pub fn sparse_clip_secs(duration_secs: f64, rate: u32) -> AudioClip {
    let len = (duration_secs * f64::from(rate)).round() as usize;
    AudioClip::from_mono_samples(vec![0.0; len], rate)
}

/// Model returning a constant vector for every segment.
pub struct ConstModel {
    pub vector: Vec<f32>,
}

impl ConstModel {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl EmbeddingModel for ConstModel {
    async fn embed_audio(&self, _segment: AudioSegmentView<'_>) -> Result<Vec<f32>, ModelError> {
        Ok(self.vector.clone())
    }

    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, ModelError> {
        Ok(self.vector.clone())
    }
}

/// Model returning a scripted vector (or failure) per call, in call order.
pub struct ScriptedModel {
    script: Mutex<Vec<Result<Vec<f32>, String>>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<Vec<f32>, String>>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingModel for ScriptedModel {
    async fn embed_audio(&self, _segment: AudioSegmentView<'_>) -> Result<Vec<f32>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        match script.remove(0) {
            Ok(vector) => Ok(vector),
            Err(message) => Err(ModelError::inference(message)),
        }
    }

    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::inference("scripted model has no text branch"))
    }
}

/// Audio source serving pre-registered clips by path.
pub struct MemoryAudioSource {
    clips: HashMap<PathBuf, AudioClip>,
}

impl MemoryAudioSource {
    pub fn new() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }

    pub fn with_clip(mut self, path: impl Into<PathBuf>, clip: AudioClip) -> Self {
        self.clips.insert(path.into(), clip);
        self
    }
}

#[async_trait]
impl AudioSource for MemoryAudioSource {
    async fn load(&self, path: &Path) -> Result<AudioClip, AudioError> {
        self.clips
            .get(path)
            .cloned()
            .ok_or_else(|| AudioError::NotFound {
                path: path.to_path_buf(),
            })
    }
}

/// Seconds of samples at the target rate, for assertions on plans.
pub fn target_rate_samples(secs: usize) -> usize {
    secs * TARGET_SAMPLE_RATE as usize
}
