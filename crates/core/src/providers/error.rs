//! Error types for the stage providers.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by an external stage provider.
///
/// Messages are user facing: they are stored on the job status and result.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Content is private, deleted or otherwise not reachable.
    #[error("{0}")]
    Unavailable(String),

    /// Transport-level failure talking to the upstream service.
    #[error("{context}: {message}")]
    Http { context: String, message: String },

    /// Upstream answered with a non-success status.
    #[error("{context}: HTTP {status}")]
    Status { context: String, status: u16 },

    /// Upstream API returned an error payload.
    #[error("{context}: {status} - {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    /// Downloaded payload is not media.
    #[error("Invalid content type: {0}. Expected video.")]
    InvalidContentType(String),

    /// Payload exceeds the configured limit.
    #[error("{what} too large (> {limit_mb} MB)")]
    TooLarge { what: String, limit_mb: u64 },

    /// Media format not accepted by the transcription service.
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Request did not finish in time.
    #[error("{context} timeout after {elapsed:?}")]
    Timeout { context: String, elapsed: Duration },

    /// Upstream returned nothing usable.
    #[error("{0}")]
    EmptyResponse(String),

    /// Response body could not be decoded.
    #[error("{context}: invalid response: {message}")]
    Json { context: String, message: String },

    /// Local I/O error while handling media.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Creates a new transport error.
    pub fn http(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Http {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Creates a new decode error.
    pub fn json(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Json {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Maps a reqwest error, distinguishing timeouts.
    pub fn from_reqwest(context: &str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                context: context.to_string(),
                elapsed: timeout,
            }
        } else {
            Self::http(context, err)
        }
    }

    /// Size limit expressed in whole megabytes.
    pub fn too_large(what: impl Into<String>, limit_bytes: u64) -> Self {
        Self::TooLarge {
            what: what.into(),
            limit_mb: limit_bytes / (1024 * 1024),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let err = ProviderError::too_large("Media file", 25 * 1024 * 1024);
        assert_eq!(err.to_string(), "Media file too large (> 25 MB)");
    }

    #[test]
    fn test_status_message() {
        let err = ProviderError::Status {
            context: "Failed to download media".to_string(),
            status: 403,
        };
        assert_eq!(err.to_string(), "Failed to download media: HTTP 403");
    }

    #[test]
    fn test_content_type_message() {
        let err = ProviderError::InvalidContentType("text/html".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid content type: text/html. Expected video."
        );
    }
}
