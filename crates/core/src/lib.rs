pub mod config;
pub mod job;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod results;
pub mod source;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use job::{
    InMemoryStatusStore, Job, JobQueue, JobState, JobStatus, QueueError, QueueSnapshot, Stage,
    StatusStore,
};
pub use pipeline::{PipelineDriver, PipelineError, Providers};
pub use providers::{
    ApifyResolver, HttpMediaFetcher, MediaFetcher, MetadataResolver, OpenAiSummarizer,
    OpenAiTranscriber, ProviderError, ReelMetadata, Summarizer, Summary, Transcriber,
    TranscriptSegment, Transcription,
};
pub use results::{
    JobResult, ResultError, ResultFilter, ResultPage, ResultSink, ResultStatus, SqliteResultSink,
};
pub use source::{analyze_url, is_supported_source, ContentKind, Platform, UrlAnalysis};
