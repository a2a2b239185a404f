//! Job, lifecycle state and stage types.

use serde::{Deserialize, Serialize};

/// A pending unit of work. Lives in the queue until it is dequeued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub source_url: String,
    pub retry_count: u32,
}

/// Lifecycle state reported through the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    ResolvingVideo,
    Downloading,
    Transcribing,
    Summarizing,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::ResolvingVideo => "resolving_video",
            JobState::Downloading => "downloading",
            JobState::Transcribing => "transcribing",
            JobState::Summarizing => "summarizing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Returns true for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the fixed pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolving,
    Downloading,
    Transcribing,
    Summarizing,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Resolving,
        Stage::Downloading,
        Stage::Transcribing,
        Stage::Summarizing,
    ];

    /// Status reported while this stage runs.
    pub fn state(&self) -> JobState {
        match self {
            Stage::Resolving => JobState::ResolvingVideo,
            Stage::Downloading => JobState::Downloading,
            Stage::Transcribing => JobState::Transcribing,
            Stage::Summarizing => JobState::Summarizing,
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            Stage::Resolving => 10,
            Stage::Downloading => 25,
            Stage::Transcribing => 50,
            Stage::Summarizing => 75,
        }
    }

    pub fn step_text(&self) -> &'static str {
        match self {
            Stage::Resolving => "Fetching reel metadata...",
            Stage::Downloading => "Downloading video...",
            Stage::Transcribing => "Transcribing audio...",
            Stage::Summarizing => "Generating summary...",
        }
    }

    /// Short name used in metric labels and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Resolving => "resolve",
            Stage::Downloading => "download",
            Stage::Transcribing => "transcribe",
            Stage::Summarizing => "summarize",
        }
    }
}

/// Latest known status of a job. Every update replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub id: String,
    pub status: JobState,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobStatus {
    pub fn queued(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobState::Queued,
            progress: 0,
            current_step: None,
            error_message: None,
        }
    }

    pub fn stage(id: impl Into<String>, stage: Stage) -> Self {
        Self {
            id: id.into(),
            status: stage.state(),
            progress: stage.progress(),
            current_step: Some(stage.step_text().to_string()),
            error_message: None,
        }
    }

    pub fn completed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobState::Completed,
            progress: 100,
            current_step: None,
            error_message: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobState::Failed,
            progress: 0,
            current_step: None,
            error_message: Some(error.into()),
        }
    }
}
