use reeldigest_core::{Config, JobQueue, SanitizedConfig};

use crate::api::rate_limit::ClientRateLimiter;

/// Shared application state
pub struct AppState {
    config: Config,
    queue: JobQueue,
    ingest_limiter: ClientRateLimiter,
}

impl AppState {
    pub fn new(config: Config, queue: JobQueue) -> Self {
        let ingest_limiter = ClientRateLimiter::new(config.rate_limit.ingest_requests_per_minute);
        Self {
            config,
            queue,
            ingest_limiter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn ingest_limiter(&self) -> &ClientRateLimiter {
        &self.ingest_limiter
    }
}
