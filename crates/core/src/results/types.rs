//! Terminal job record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::Stage;
use crate::providers::{ReelMetadata, Summary, Transcription};

/// Terminal outcome stored on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Completed,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Completed => "completed",
            ResultStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(ResultStatus::Completed),
            "failed" => Some(ResultStatus::Failed),
            _ => None,
        }
    }
}

/// Models used to produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub transcription: String,
    pub summarization: String,
}

/// Wall-clock duration of each stage that ran, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribe_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarize_ms: Option<u64>,
}

impl StageMetrics {
    pub fn record(&mut self, stage: Stage, millis: u64) {
        let slot = match stage {
            Stage::Resolving => &mut self.resolve_ms,
            Stage::Downloading => &mut self.download_ms,
            Stage::Transcribing => &mut self.transcribe_ms,
            Stage::Summarizing => &mut self.summarize_ms,
        };
        *slot = Some(millis);
    }

    pub fn get(&self, stage: Stage) -> Option<u64> {
        match stage {
            Stage::Resolving => self.resolve_ms,
            Stage::Downloading => self.download_ms,
            Stage::Transcribing => self.transcribe_ms,
            Stage::Summarizing => self.summarize_ms,
        }
    }
}

/// Source post details kept alongside the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl From<&ReelMetadata> for SourceMetadata {
    fn from(meta: &ReelMetadata) -> Self {
        Self {
            caption: meta.caption.clone(),
            like_count: meta.like_count,
            comment_count: meta.comment_count,
            play_count: meta.play_count,
            duration_secs: meta.duration_secs,
        }
    }
}

/// Durable record of a job's terminal outcome, keyed by job id.
///
/// Outputs of stages that never ran stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub id: String,
    pub source_url: String,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Transcription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SourceMetadata>,
    pub model_info: ModelInfo,
    #[serde(default)]
    pub metrics: StageMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobResult {
    /// Empty record for a job that is about to start. Marked failed until
    /// the pipeline finishes.
    pub fn started(
        id: impl Into<String>,
        source_url: impl Into<String>,
        model_info: ModelInfo,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source_url: source_url.into(),
            status: ResultStatus::Failed,
            error: None,
            video_url: None,
            transcript: None,
            summary: None,
            metadata: None,
            model_info,
            metrics: StageMetrics::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Text indexed for search: id, transcript, summary and caption.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![self.id.as_str(), self.source_url.as_str()];
        if let Some(ref t) = self.transcript {
            parts.push(&t.text);
        }
        if let Some(ref s) = self.summary {
            parts.push(&s.title);
            parts.push(&s.tldr);
            parts.extend(s.bullets.iter().map(String::as_str));
            parts.extend(s.entities.iter().map(String::as_str));
        }
        if let Some(caption) = self.metadata.as_ref().and_then(|m| m.caption.as_deref()) {
            parts.push(caption);
        }
        parts.join("\n").to_lowercase()
    }
}
