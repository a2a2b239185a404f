//! Pipeline driver: resolve, download, transcribe, summarize.

mod driver;
mod error;

pub use driver::{PipelineDriver, Providers};
pub use error::{PipelineError, INTERNAL_ERROR, MEDIA_UNAVAILABLE};
