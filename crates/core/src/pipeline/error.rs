use thiserror::Error;

use crate::job::Stage;
use crate::providers::ProviderError;
use crate::results::ResultError;

/// Message recorded when resolution yields no media URL.
pub const MEDIA_UNAVAILABLE: &str =
    "No media URL found. The content may be private or unavailable.";

/// Message recorded when a pipeline run ends unexpectedly.
pub const INTERNAL_ERROR: &str = "Internal error while processing the job";

/// Why a pipeline run did not complete.
///
/// The display text is stored verbatim as the job's error message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("{}", MEDIA_UNAVAILABLE)]
    MediaUnavailable,

    #[error("Failed to store result: {0}")]
    Sink(#[from] ResultError),

    /// A stage panicked. Outputs of earlier stages are still kept.
    #[error("{}", INTERNAL_ERROR)]
    Panicked,
}

impl PipelineError {
    /// Stage that failed, if the failure came from a provider.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::MediaUnavailable => Some(Stage::Resolving),
            PipelineError::Sink(_) | PipelineError::Panicked => None,
        }
    }

    /// Label for logs and the finished-jobs metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            PipelineError::Panicked => "panicked",
            _ => "failed",
        }
    }
}
