//! Mock media fetcher for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::Stage;
use crate::providers::{MediaFetcher, ProviderError};

use super::recorder::StageRecorder;

/// Mock implementation of the MediaFetcher trait.
///
/// Returns `<dir>/<job_id>.mp4`. When created with [`MockFetcher::writing_to`]
/// it also writes a small placeholder file there so cleanup can be checked.
#[derive(Debug)]
pub struct MockFetcher {
    recorder: StageRecorder,
    dir: PathBuf,
    write_files: bool,
    next_error: Arc<RwLock<Option<ProviderError>>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockFetcher {
    pub fn new(recorder: StageRecorder) -> Self {
        Self {
            recorder,
            dir: PathBuf::from("mock-media"),
            write_files: false,
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Fetcher that writes placeholder media files into `dir`.
    pub fn writing_to(recorder: StageRecorder, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_files: true,
            ..Self::new(recorder)
        }
    }

    pub fn path_for(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.mp4", job_id))
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, job_id: &str, _media_url: &str) -> Result<PathBuf, ProviderError> {
        let _call = self.recorder.begin(Stage::Downloading, job_id);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let path = self.path_for(job_id);
        if self.write_files {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, b"mock media").await?;
        }
        Ok(path)
    }
}
