//! File-backed step counter provider.
//!
//! Stands in for the native sensor query: a companion process keeps the
//! day's cumulative count in a small file, and this provider reads it on
//! every cycle.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use stepsync_core::{StepCounterProvider, SyncError};

pub struct FileStepProvider {
    path: PathBuf,
}

impl FileStepProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StepCounterProvider for FileStepProvider {
    fn fetch(
        &self,
        _start: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> BoxFuture<'_, stepsync_core::Result<f64>> {
        async move {
            let raw = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| SyncError::CounterUnavailable(format!("{}: {e}", self.path.display())))?;
            let trimmed = raw.trim();
            trimmed.parse::<f64>().map_err(|_| {
                SyncError::CounterUnavailable(format!(
                    "{}: expected a number, got '{trimmed}'",
                    self.path.display()
                ))
            })
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stepsync_core::ErrorKind;

    fn provider_with(content: &str) -> (tempfile::TempDir, FileStepProvider) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps");
        std::fs::write(&path, content).unwrap();
        (dir, FileStepProvider::new(path))
    }

    #[tokio::test]
    async fn reads_a_plain_count() {
        let (_dir, provider) = provider_with("1234.5\n");
        let count = provider.fetch(Utc::now(), Utc::now()).await.unwrap();
        assert_eq!(count, 1234.5);
    }

    #[tokio::test]
    async fn missing_file_is_counter_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileStepProvider::new(dir.path().join("absent"));
        let err = provider.fetch(Utc::now(), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::CounterUnavailable));
    }

    #[tokio::test]
    async fn garbage_content_is_counter_unavailable() {
        let (_dir, provider) = provider_with("not a number");
        let err = provider.fetch(Utc::now(), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::CounterUnavailable));
    }
}
