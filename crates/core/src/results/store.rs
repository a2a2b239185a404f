//! Result sink trait and query types.

use std::fmt;

use serde::Serialize;

use super::types::{JobResult, ResultStatus};

/// Error type for result sink operations.
#[derive(Debug)]
pub enum ResultError {
    /// Database error.
    Database(String),
    /// Stored payload could not be encoded or decoded.
    Serialization(String),
}

impl fmt::Display for ResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultError::Database(msg) => write!(f, "Database error: {}", msg),
            ResultError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ResultError {}

/// Filter for listing results.
#[derive(Debug, Clone)]
pub struct ResultFilter {
    pub status: Option<ResultStatus>,
    /// Case-insensitive substring match on id, transcript, summary and caption.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            limit: 20,
            offset: 0,
        }
    }
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ResultStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of results plus the total matching the filter.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    pub results: Vec<JobResult>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Durable key-value store of terminal job results.
///
/// Writes are upserts keyed by job id.
pub trait ResultSink: Send + Sync {
    fn write(&self, result: &JobResult) -> Result<(), ResultError>;

    fn read(&self, id: &str) -> Result<Option<JobResult>, ResultError>;

    /// Deletes the result. Returns whether one existed.
    fn delete(&self, id: &str) -> Result<bool, ResultError>;

    /// Lists results, newest first.
    fn list(&self, filter: &ResultFilter) -> Result<Vec<JobResult>, ResultError>;

    /// Counts results matching the filter, ignoring limit and offset.
    fn count(&self, filter: &ResultFilter) -> Result<i64, ResultError>;
}
