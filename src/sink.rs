use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::analysis::PipelineRun;

/// Downstream consumer of finished runs. It receives an arbitrary string-keyed structure
/// and only reports whether it was accepted.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn store(&self, run_id: Uuid, payload: Value) -> Result<()>;
}

pub fn run_payload(run: &PipelineRun) -> Result<Value> {
    serde_json::to_value(run).context("failed to serialize pipeline run")
}

/// Writes each run to `<dir>/<run_id>.json`.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, run_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", run_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn store(&self, run_id: Uuid, payload: Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create results directory {}", self.dir.display()))?;

        let path = self.path_for(run_id);
        let body = serde_json::to_vec_pretty(&payload)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!("Stored run {} at {}", run_id, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_json_file_sink_writes_run() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("nested"));
        let id = Uuid::new_v4();

        sink.store(id, json!({"primary_type": "hormones"})).await.unwrap();

        let written = std::fs::read_to_string(sink.path_for(id)).unwrap();
        let value: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["primary_type"], "hormones");
    }
}
