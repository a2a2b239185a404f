//! Mock transcriber for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::job::Stage;
use crate::providers::{ProviderError, Transcriber, TranscriptSegment, Transcription};

use super::recorder::StageRecorder;

/// Mock implementation of the Transcriber trait.
///
/// By default the transcript text names the media file it was made from,
/// so later stages can be traced back to a job.
#[derive(Debug)]
pub struct MockTranscriber {
    recorder: StageRecorder,
    next_error: Arc<RwLock<Option<ProviderError>>>,
    with_segments: Arc<RwLock<bool>>,
}

impl MockTranscriber {
    pub fn new(recorder: StageRecorder) -> Self {
        Self {
            recorder,
            next_error: Arc::new(RwLock::new(None)),
            with_segments: Arc::new(RwLock::new(true)),
        }
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ProviderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Whether transcripts carry timestamped segments.
    pub async fn set_with_segments(&self, with_segments: bool) {
        *self.with_segments.write().await = with_segments;
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    fn model(&self) -> &str {
        "mock-whisper"
    }

    async fn transcribe(&self, path: &Path) -> Result<Transcription, ProviderError> {
        let _call = self
            .recorder
            .begin(Stage::Transcribing, path.display().to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("media");
        let text = format!("Transcript of {}", stem);

        let segments = if *self.with_segments.read().await {
            Some(vec![
                TranscriptSegment {
                    id: 0,
                    start: 0.0,
                    end: 4.5,
                    text: "Transcript".to_string(),
                },
                TranscriptSegment {
                    id: 1,
                    start: 4.5,
                    end: 9.0,
                    text: format!("of {}", stem),
                },
            ])
        } else {
            None
        };

        Ok(Transcription {
            text,
            language: Some("en".to_string()),
            segments,
        })
    }
}
