//! Testing utilities and mock implementations of the stage providers.
//!
//! All mocks share one [`StageRecorder`], so tests can assert on stage order
//! and on how many stage calls were ever in flight at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use reeldigest_core::testing::MockProviders;
//!
//! let mocks = MockProviders::new();
//! let queue = mocks.queue();
//!
//! mocks.fetcher.set_next_error(ProviderError::InvalidContentType("text/html".into())).await;
//! let id = queue.submit("https://www.instagram.com/reel/abc/");
//! ```

mod mock_fetcher;
mod mock_resolver;
mod mock_summarizer;
mod mock_transcriber;
mod recorder;

pub use mock_fetcher::MockFetcher;
pub use mock_resolver::MockResolver;
pub use mock_summarizer::MockSummarizer;
pub use mock_transcriber::MockTranscriber;
pub use recorder::{Gate, StageCall, StageGuard, StageRecorder};

use std::sync::Arc;

use crate::job::{InMemoryStatusStore, JobQueue};
use crate::pipeline::Providers;
use crate::results::SqliteResultSink;

/// A full set of mock providers sharing one recorder.
pub struct MockProviders {
    pub recorder: StageRecorder,
    pub resolver: Arc<MockResolver>,
    pub fetcher: Arc<MockFetcher>,
    pub transcriber: Arc<MockTranscriber>,
    pub summarizer: Arc<MockSummarizer>,
    pub statuses: Arc<InMemoryStatusStore>,
    pub results: Arc<SqliteResultSink>,
}

impl Default for MockProviders {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProviders {
    pub fn new() -> Self {
        let recorder = StageRecorder::new();
        Self::with_fetcher(MockFetcher::new(recorder.clone()), recorder)
    }

    /// Mocks whose fetcher writes placeholder media into `dir`.
    pub fn with_media_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        let recorder = StageRecorder::new();
        Self::with_fetcher(MockFetcher::writing_to(recorder.clone(), dir), recorder)
    }

    fn with_fetcher(fetcher: MockFetcher, recorder: StageRecorder) -> Self {
        Self {
            resolver: Arc::new(MockResolver::new(recorder.clone())),
            fetcher: Arc::new(fetcher),
            transcriber: Arc::new(MockTranscriber::new(recorder.clone())),
            summarizer: Arc::new(MockSummarizer::new(recorder.clone())),
            statuses: Arc::new(InMemoryStatusStore::new()),
            results: Arc::new(
                SqliteResultSink::in_memory().expect("in-memory result sink"),
            ),
            recorder,
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            resolver: self.resolver.clone(),
            fetcher: self.fetcher.clone(),
            transcriber: self.transcriber.clone(),
            summarizer: self.summarizer.clone(),
        }
    }

    /// Queue wired to these mocks and their stores.
    pub fn queue(&self) -> JobQueue {
        JobQueue::new(self.providers(), self.statuses.clone(), self.results.clone())
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::time::Duration;

    use crate::job::{JobQueue, JobState, JobStatus};
    use crate::providers::ReelMetadata;

    /// A reel URL with a recognizable slug.
    pub fn reel_url(slug: &str) -> String {
        format!("https://www.instagram.com/reel/{}/", slug)
    }

    /// Metadata for private or removed content: no media URL.
    pub fn unavailable_metadata() -> ReelMetadata {
        ReelMetadata {
            caption: Some("This content isn't available".to_string()),
            ..Default::default()
        }
    }

    /// Polls until the job reaches a terminal state, panicking after `timeout`.
    pub async fn wait_for_terminal(queue: &JobQueue, id: &str, timeout: Duration) -> JobStatus {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(status) = queue.status(id) {
                if status.status.is_terminal() {
                    return status;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                panic!(
                    "job {} did not finish in {:?}, last status: {:?}",
                    id,
                    timeout,
                    queue.status(id)
                );
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Polls until the job reports `state`, panicking after `timeout`.
    pub async fn wait_for_state(
        queue: &JobQueue,
        id: &str,
        state: JobState,
        timeout: Duration,
    ) -> JobStatus {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(status) = queue.status(id).filter(|s| s.status == state) {
                return status;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!(
                    "job {} never reached {}, last status: {:?}",
                    id,
                    state,
                    queue.status(id)
                );
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Polls until the queue is idle with nothing pending.
    pub async fn wait_for_idle(queue: &JobQueue, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while queue.is_busy() || queue.pending_len() > 0 {
            if tokio::time::Instant::now() >= deadline {
                panic!("queue still busy after {:?}: {:?}", timeout, queue.snapshot());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
