/*!
JSON file checkpointer.

The durable form is the pipeline's interchange format: a JSON array of
Result objects, one file per stage. The file must be valid JSON after
every flush, so a flush writes the whole serialized array to a temporary
file in the same directory, syncs it, and renames it over the destination.
A crash mid-write leaves the previous checkpoint untouched; a crash after
the rename leaves the new one; there is no in-between state.
*/

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::checkpointer::{Checkpoint, Checkpointer, Result};
use super::persistence::{results_from_json, results_to_json};

/// Durable checkpointer backed by one JSON array file.
#[derive(Clone, Debug)]
pub struct JsonCheckpointer {
    path: PathBuf,
}

impl JsonCheckpointer {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        // Same directory as the destination so the rename stays on one
        // filesystem and remains atomic.
        let mut os = self.path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

#[async_trait]
impl Checkpointer for JsonCheckpointer {
    #[instrument(skip(self, checkpoint), fields(path = %self.path.display()), err)]
    async fn flush(&self, checkpoint: &Checkpoint) -> Result<()> {
        let body = results_to_json(checkpoint.results(), checkpoint.outcome_field())?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(body.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp, &self.path).await?;
        debug!(results = checkpoint.len(), "checkpoint flushed");
        Ok(())
    }

    async fn load(&self, outcome_field: &str) -> Result<Option<Checkpoint>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let results = results_from_json(&raw, outcome_field)?;
        debug!(
            path = %self.path.display(),
            results = results.len(),
            "checkpoint loaded"
        );
        Ok(Some(Checkpoint::from_results(outcome_field, results)))
    }
}
