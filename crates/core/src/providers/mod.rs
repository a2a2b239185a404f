//! External stage providers: metadata resolution, media download,
//! transcription and summarization.
//!
//! Each provider is a trait so the pipeline can run against the production
//! HTTP clients or the mocks in [`crate::testing`].

mod apify;
mod download;
mod error;
mod openai;
mod traits;
mod types;

pub use apify::ApifyResolver;
pub use download::HttpMediaFetcher;
pub use error::ProviderError;
pub use openai::{format_timestamp, OpenAiSummarizer, OpenAiTranscriber};
pub use traits::{MediaFetcher, MetadataResolver, Summarizer, Transcriber};
pub use types::{KeyMoment, ReelMetadata, Summary, TranscriptSegment, Transcription};
