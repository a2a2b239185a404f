//! Trait definitions for the external stage providers.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ProviderError;
use super::types::{ReelMetadata, Summary, TranscriptSegment, Transcription};

/// Resolves a source URL into media metadata.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Returns the name of this resolver implementation.
    fn name(&self) -> &str;

    /// Resolves metadata for the given source URL.
    ///
    /// A successful call may still carry no media URL; the pipeline treats
    /// that as unavailable content.
    async fn resolve(&self, source_url: &str) -> Result<ReelMetadata, ProviderError>;
}

/// Fetches media into transient local storage.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Downloads `media_url` and returns the local path of the file.
    async fn fetch(&self, job_id: &str, media_url: &str) -> Result<PathBuf, ProviderError>;
}

/// Turns a media file into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Model identifier recorded on job results.
    fn model(&self) -> &str;

    /// Transcribes the media file at `path`.
    async fn transcribe(&self, path: &Path) -> Result<Transcription, ProviderError>;
}

/// Produces a structured summary from transcript text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Model identifier recorded on job results.
    fn model(&self) -> &str;

    /// Summarizes `text`, using timestamped segments when available.
    async fn summarize(
        &self,
        text: &str,
        segments: Option<&[TranscriptSegment]>,
    ) -> Result<Summary, ProviderError>;
}
