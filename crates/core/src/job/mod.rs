//! Job model, status store and the single-flight queue.

mod queue;
mod status;
mod types;

pub use queue::{JobQueue, QueueError, QueueSnapshot};
pub use status::{InMemoryStatusStore, StatusStore};
pub use types::{Job, JobState, JobStatus, Stage};
