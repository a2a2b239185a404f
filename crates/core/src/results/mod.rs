//! Durable storage of terminal job results.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteResultSink;
pub use store::{ResultError, ResultFilter, ResultPage, ResultSink};
pub use types::{JobResult, ModelInfo, ResultStatus, SourceMetadata, StageMetrics};
