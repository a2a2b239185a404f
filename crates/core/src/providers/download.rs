//! HTTP media fetcher.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::DownloadConfig;

use super::error::ProviderError;
use super::traits::MediaFetcher;

const CONTEXT: &str = "Failed to download media";

/// Downloads media over HTTP into a temp directory, one file per job.
pub struct HttpMediaFetcher {
    client: reqwest::Client,
    temp_dir: PathBuf,
    max_bytes: u64,
    timeout: Duration,
}

impl HttpMediaFetcher {
    pub fn new(config: &DownloadConfig, temp_dir: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ProviderError::http(CONTEXT, e))?;

        Ok(Self {
            client,
            temp_dir: temp_dir.into(),
            max_bytes: config.max_bytes,
            timeout,
        })
    }

    /// Path the media for `job_id` is written to.
    pub fn temp_path(&self, job_id: &str) -> PathBuf {
        self.temp_dir.join(format!("{}.mp4", job_id))
    }

    async fn download_to(&self, media_url: &str, path: &Path) -> Result<u64, ProviderError> {
        let mut response = self
            .client
            .get(media_url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest("Download", e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                context: CONTEXT.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_media_content_type(content_type) {
                return Err(ProviderError::InvalidContentType(content_type.to_string()));
            }
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes)
        {
            return Err(ProviderError::too_large("Media file", self.max_bytes));
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ProviderError::from_reqwest("Download", e, self.timeout))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(ProviderError::too_large("Media file", self.max_bytes));
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(written)
    }
}

fn is_media_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("video") || content_type.contains("octet-stream")
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, job_id: &str, media_url: &str) -> Result<PathBuf, ProviderError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let path = self.temp_path(job_id);

        match self.download_to(media_url, &path).await {
            Ok(bytes) => {
                debug!(job_id, bytes, path = %path.display(), "Media downloaded");
                Ok(path)
            }
            Err(e) => {
                if let Err(rm_err) = tokio::fs::remove_file(&path).await {
                    if rm_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(job_id, "Failed to remove partial download: {}", rm_err);
                    }
                }
                Err(e)
            }
        }
    }
}
