//! Per-client token bucket rate limiting for ingest requests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token bucket for a single client.
///
/// Tokens are added at a constant rate and consumed by requests. The bucket
/// starts full, so a client can burst up to the per-minute capacity.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f32,
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Takes a token, or returns how long until one is available.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            Err(Duration::from_secs_f32(tokens_needed / self.refill_rate))
        }
    }

    fn is_full(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.tokens >= self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// One token bucket per client key (usually the client IP).
#[derive(Debug)]
pub struct ClientRateLimiter {
    requests_per_minute: u32,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl ClientRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Takes a token for `client`, or returns how long the client must wait.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        // Idle clients hold a full bucket, which is the same as having none
        if buckets.len() > 1024 {
            buckets.retain(|_, bucket| !bucket.is_full(now));
        }

        buckets
            .entry(client.to_string())
            .or_insert_with(|| TokenBucket::new(self.requests_per_minute))
            .try_acquire_at(now)
    }
}
