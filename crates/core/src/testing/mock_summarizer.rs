//! Mock summarizer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::job::Stage;
use crate::providers::{KeyMoment, ProviderError, Summarizer, Summary, TranscriptSegment};

use super::recorder::StageRecorder;

/// Mock implementation of the Summarizer trait.
#[derive(Debug)]
pub struct MockSummarizer {
    recorder: StageRecorder,
    next_error: Arc<RwLock<Option<ProviderError>>>,
    segment_counts: Arc<RwLock<Vec<usize>>>,
    panic_next: Arc<RwLock<bool>>,
}

impl MockSummarizer {
    pub fn new(recorder: StageRecorder) -> Self {
        Self {
            recorder,
            next_error: Arc::new(RwLock::new(None)),
            segment_counts: Arc::new(RwLock::new(Vec::new())),
            panic_next: Arc::new(RwLock::new(false)),
        }
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Panic on the next call.
    pub async fn set_panic_next(&self) {
        *self.panic_next.write().await = true;
    }

    /// Number of segments passed on each call, in call order.
    pub async fn recorded_segment_counts(&self) -> Vec<usize> {
        self.segment_counts.read().await.clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    fn model(&self) -> &str {
        "mock-gpt"
    }

    async fn summarize(
        &self,
        text: &str,
        segments: Option<&[TranscriptSegment]>,
    ) -> Result<Summary, ProviderError> {
        let _call = self.recorder.begin(Stage::Summarizing, text);
        self.segment_counts
            .write()
            .await
            .push(segments.map_or(0, |s| s.len()));

        if std::mem::take(&mut *self.panic_next.write().await) {
            panic!("mock summarizer panic");
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let key_moments = segments.map(|segments| {
            segments
                .iter()
                .map(|seg| KeyMoment {
                    time: crate::providers::format_timestamp(seg.start),
                    description: seg.text.clone(),
                })
                .collect()
        });

        Ok(Summary {
            title: "Mock summary".to_string(),
            tldr: format!("Summary of: {}", text),
            bullets: vec!["First point".to_string(), "Second point".to_string()],
            entities: vec!["Instagram".to_string()],
            key_moments,
        }
        .normalized())
    }
}
