//! Prometheus metrics for the job engine.
//!
//! This module provides metrics for:
//! - Job submission (new jobs and retries)
//! - Job outcomes
//! - Per-stage durations of the pipeline

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Queue
// =============================================================================

/// Jobs submitted to the queue by kind.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reeldigest_jobs_submitted_total", "Total jobs submitted"),
        &["kind"], // "enqueue", "retry"
    )
    .unwrap()
});

/// Jobs that reached a terminal state by result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reeldigest_jobs_finished_total",
            "Total jobs that reached a terminal state",
        ),
        &["result"], // "completed", "failed", "panicked"
    )
    .unwrap()
});

// =============================================================================
// Pipeline
// =============================================================================

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reeldigest_stage_duration_seconds",
            "Duration of pipeline stages",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["stage", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(STAGE_DURATION.clone()),
    ]
}
