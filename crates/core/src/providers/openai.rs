//! OpenAI-backed transcription and summarization.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::OpenAiConfig;

use super::error::ProviderError;
use super::traits::{Summarizer, Transcriber};
use super::types::{Summary, TranscriptSegment, Transcription};

const SUPPORTED_FORMATS: &str = "mp3, mp4, mpeg, mpga, m4a, wav, webm";

const SUMMARY_PROMPT: &str = r#"You analyze and summarize short-form social media videos.
Write faithful, concise summaries that capture the key points of the content.

Respond with a JSON object of exactly this shape:
{
  "title": "Catchy, descriptive title (max 10 words)",
  "tldr": "One sentence summary of the whole video",
  "bullets": ["Up to five concise key points"],
  "entities": ["Named people, places, products, brands, organizations"],
  "key_moments": [{"time": "0:15", "description": "What happens at this timestamp"}]
}

Guidelines:
- Stay accurate to the source content
- Keep bullets to one or two sentences
- Only include key_moments when timestamps are available and the moments matter
- Use empty arrays when there are no entities or key moments"#;

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

fn build_client(config: &OpenAiConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ProviderError::http("OpenAI client", e))
}

/// Reads the error message out of an OpenAI error body, falling back to the raw text.
fn api_error(context: &str, status: u16, body: String) -> ProviderError {
    let message = serde_json::from_str::<OpenAiErrorBody>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    ProviderError::Api {
        context: context.to_string(),
        status,
        message,
    }
}

// ============================================================================
// Transcription
// ============================================================================

/// Uploads media to the audio transcription endpoint.
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Option<Vec<RawSegment>>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    text: String,
}

impl OpenAiTranscriber {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }

    /// Only `whisper-1` supports segment timestamps.
    fn wants_segments(&self) -> bool {
        self.config.transcription_model == "whisper-1"
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    fn model(&self) -> &str {
        &self.config.transcription_model
    }

    async fn transcribe(&self, path: &Path) -> Result<Transcription, ProviderError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.config.max_upload_bytes {
            return Err(ProviderError::too_large(
                "Audio file",
                self.config.max_upload_bytes,
            ));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media.mp4")
            .to_string();

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| ProviderError::http("Transcription failed", e))?;

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.config.transcription_model.clone())
            .part("file", file_part);
        form = if self.wants_segments() {
            form.text("response_format", "verbose_json")
                .text("timestamp_granularities[]", "segment")
        } else {
            form.text("response_format", "json")
        };

        debug!(model = %self.config.transcription_model, size, "Uploading media for transcription");

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let response = self
            .client
            .post(format!(
                "{}/v1/audio/transcriptions",
                self.config.api_base.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest("Transcription", e, timeout))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            if body.to_lowercase().contains("unsupported")
                || body.to_lowercase().contains("invalid file format")
            {
                return Err(ProviderError::UnsupportedFormat(format!(
                    "supported formats: {}",
                    SUPPORTED_FORMATS
                )));
            }
            return Err(api_error("Transcription failed", status, body));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::json("Transcription failed", e))?;

        Ok(into_transcription(parsed))
    }
}

fn into_transcription(response: TranscriptionResponse) -> Transcription {
    let segments = response.segments.map(|segments| {
        segments
            .into_iter()
            .enumerate()
            .map(|(idx, seg)| TranscriptSegment {
                id: idx as u32,
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect()
    });

    Transcription {
        text: response.text,
        language: response.language,
        segments,
    }
}

// ============================================================================
// Summarization
// ============================================================================

/// Produces structured summaries with the chat completions endpoint.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiSummarizer {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(&config)?,
            config,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn model(&self) -> &str {
        &self.config.summarization_model
    }

    async fn summarize(
        &self,
        text: &str,
        segments: Option<&[TranscriptSegment]>,
    ) -> Result<Summary, ProviderError> {
        let request = ChatRequest {
            model: &self.config.summarization_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SUMMARY_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message(text, segments),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            temperature: 0.3,
        };

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let response = self
            .client
            .post(format!(
                "{}/v1/chat/completions",
                self.config.api_base.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest("Summarization", e, timeout))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error("Summarization failed", status, body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::json("Summarization failed", e))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::EmptyResponse(
                    "Summarization failed: no content returned".to_string(),
                )
            })?;

        parse_summary(&content)
    }
}

fn parse_summary(content: &str) -> Result<Summary, ProviderError> {
    let summary: Summary = serde_json::from_str(content)
        .map_err(|e| ProviderError::json("Summarization failed", e))?;
    Ok(summary.normalized())
}

fn user_message(text: &str, segments: Option<&[TranscriptSegment]>) -> String {
    let mut message = format!(
        "Here is the transcript from an Instagram Reel:\n\n{}",
        text
    );

    if let Some(segments) = segments.filter(|s| !s.is_empty()) {
        message.push_str("\n\nTimestamped segments:\n");
        for seg in segments {
            message.push_str(&format!("[{}] {}\n", format_timestamp(seg.start), seg.text));
        }
    }

    message
}

/// Formats seconds as `m:ss`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: u32, start: f64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id,
            start,
            end: start + 2.0,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(9.7), "0:09");
        assert_eq!(format_timestamp(75.2), "1:15");
        assert_eq!(format_timestamp(600.0), "10:00");
    }

    #[test]
    fn test_user_message_with_segments() {
        let segments = vec![segment(0, 0.0, "Hello"), segment(1, 65.0, "Step two")];
        let msg = user_message("Hello. Step two", Some(&segments));
        assert!(msg.starts_with("Here is the transcript"));
        assert!(msg.contains("Timestamped segments:\n[0:00] Hello\n[1:05] Step two\n"));
    }

    #[test]
    fn test_user_message_without_segments() {
        let msg = user_message("plain", Some(&[]));
        assert!(!msg.contains("Timestamped segments"));
        let msg = user_message("plain", None);
        assert!(msg.ends_with("plain"));
    }

    #[test]
    fn test_parse_summary_accepts_camel_case_moments() {
        let summary = parse_summary(
            r#"{"title":"Pasta","tldr":"Cook pasta","bullets":["Boil"],"entities":["Rome"],
               "keyMoments":[{"time":"0:15","description":"Add salt"}]}"#,
        )
        .unwrap();
        assert_eq!(summary.title, "Pasta");
        assert_eq!(summary.key_moments.unwrap()[0].time, "0:15");
    }

    #[test]
    fn test_parse_summary_drops_empty_moments() {
        let summary =
            parse_summary(r#"{"title":"t","tldr":"x","bullets":[],"entities":[],"key_moments":[]}"#)
                .unwrap();
        assert!(summary.key_moments.is_none());
    }

    #[test]
    fn test_parse_summary_rejects_garbage() {
        let err = parse_summary("not json").unwrap_err();
        assert!(err.to_string().starts_with("Summarization failed"));
    }

    #[test]
    fn test_into_transcription_trims_and_numbers_segments() {
        let response = TranscriptionResponse {
            text: "Hi there".to_string(),
            language: Some("english".to_string()),
            segments: Some(vec![
                RawSegment {
                    start: 0.0,
                    end: 1.0,
                    text: " Hi ".to_string(),
                },
                RawSegment {
                    start: 1.0,
                    end: 2.0,
                    text: "there ".to_string(),
                },
            ]),
        };
        let t = into_transcription(response);
        let segments = t.segments.unwrap();
        assert_eq!(segments[0].text, "Hi");
        assert_eq!(segments[1].id, 1);
        assert_eq!(t.language.as_deref(), Some("english"));
    }

    #[test]
    fn test_api_error_extracts_message() {
        let err = api_error(
            "Summarization failed",
            429,
            r#"{"error":{"message":"Rate limit reached"}}"#.to_string(),
        );
        assert_eq!(
            err.to_string(),
            "Summarization failed: 429 - Rate limit reached"
        );
    }

    #[tokio::test]
    async fn test_transcribe_rejects_oversize_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.mp4");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        let config = OpenAiConfig {
            api_key: "sk-test".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            transcription_model: "whisper-1".to_string(),
            summarization_model: "gpt-4o-mini".to_string(),
            max_upload_bytes: 1024,
            timeout_secs: 5,
        };
        let transcriber = OpenAiTranscriber::new(config).unwrap();
        let err = transcriber.transcribe(&path).await.unwrap_err();
        assert!(matches!(err, ProviderError::TooLarge { .. }));
    }
}
