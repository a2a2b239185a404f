//! Mock metadata resolver for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::job::Stage;
use crate::providers::{MetadataResolver, ProviderError, ReelMetadata};

use super::recorder::{Gate, StageRecorder};

/// Mock implementation of the MetadataResolver trait.
///
/// Returns per-URL metadata when configured, otherwise a default with a
/// media URL derived from the source URL.
///
/// # Example
///
/// ```rust,ignore
/// use reeldigest_core::testing::MockResolver;
///
/// let resolver = MockResolver::new(recorder.clone());
/// resolver.set_metadata("https://instagram.com/reel/private", ReelMetadata::default()).await;
/// resolver.gate().close(); // hold every resolve call until opened
/// ```
#[derive(Debug)]
pub struct MockResolver {
    recorder: StageRecorder,
    metadata: Arc<RwLock<HashMap<String, ReelMetadata>>>,
    errors: Arc<RwLock<HashMap<String, ProviderError>>>,
    next_error: Arc<RwLock<Option<ProviderError>>>,
    panic_on: Arc<RwLock<Option<String>>>,
    delay: Arc<RwLock<Duration>>,
    gate: Gate,
}

impl MockResolver {
    pub fn new(recorder: StageRecorder) -> Self {
        Self {
            recorder,
            metadata: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic_on: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            gate: Gate::new(),
        }
    }

    /// Metadata to return for a specific source URL.
    pub async fn set_metadata(&self, source_url: &str, metadata: ReelMetadata) {
        self.metadata
            .write()
            .await
            .insert(source_url.to_string(), metadata);
    }

    /// Fail the next call for `source_url` with `error`.
    pub async fn set_error_for(&self, source_url: &str, error: ProviderError) {
        self.errors
            .write()
            .await
            .insert(source_url.to_string(), error);
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Panic when resolving `source_url`.
    pub async fn set_panic_on(&self, source_url: &str) {
        *self.panic_on.write().await = Some(source_url.to_string());
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Gate every call waits on. Open by default.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Default metadata for a URL: a CDN media URL and a caption.
    pub fn default_metadata(source_url: &str) -> ReelMetadata {
        let slug = source_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("reel");
        ReelMetadata {
            media_url: Some(format!("https://cdn.example.com/media/{}.mp4", slug)),
            caption: Some(format!("Caption for {}", slug)),
            like_count: Some(100),
            comment_count: Some(5),
            play_count: Some(2_000),
            duration_secs: Some(30.0),
        }
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn resolve(&self, source_url: &str) -> Result<ReelMetadata, ProviderError> {
        let _call = self.recorder.begin(Stage::Resolving, source_url);
        self.gate.pass().await;

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panic_on.read().await.as_deref() == Some(source_url) {
            panic!("mock resolver panic for {}", source_url);
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(error) = self.errors.write().await.remove(source_url) {
            return Err(error);
        }

        Ok(self
            .metadata
            .read()
            .await
            .get(source_url)
            .cloned()
            .unwrap_or_else(|| Self::default_metadata(source_url)))
    }
}
