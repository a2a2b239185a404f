mod handlers;
pub mod middleware;
pub mod rate_limit;
mod reels;
mod routes;

pub use reels::{DeletedResponse, ErrorResponse, IngestBody, ListReelsParams, QueuedResponse};
pub use routes::create_router;
