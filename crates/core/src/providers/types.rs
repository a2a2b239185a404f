//! Types produced by the stage providers.

use serde::{Deserialize, Serialize};

/// Metadata resolved for a source URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReelMetadata {
    /// Direct URL of the media file, absent when the content is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u64>,
    /// Duration in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// A timestamped piece of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub id: u32,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub text: String,
}

/// Output of the transcription stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
}

/// A notable moment in the media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    /// Timestamp as `m:ss`.
    pub time: String,
    pub description: String,
}

/// Structured summary of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub tldr: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default, alias = "keyMoments", skip_serializing_if = "Option::is_none")]
    pub key_moments: Option<Vec<KeyMoment>>,
}

impl Summary {
    /// Drops an empty key moment list so it serializes as absent.
    pub fn normalized(mut self) -> Self {
        if self.key_moments.as_ref().is_some_and(|m| m.is_empty()) {
            self.key_moments = None;
        }
        self
    }
}
