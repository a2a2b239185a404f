//! Single-flight job queue.
//!
//! Pending jobs wait in an ordered list. At most one job runs at a time: the
//! `busy` flag is set under the same lock that pops a job, and is cleared
//! only by the drain task once the list is empty. Enqueue and retry calls
//! that arrive while a job runs just extend the list; the running drain task
//! picks them up.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::metrics;
use crate::pipeline::{PipelineDriver, Providers, INTERNAL_ERROR};
use crate::results::{
    JobResult, ResultError, ResultFilter, ResultPage, ResultSink, ResultStatus,
};

use super::status::StatusStore;
use super::types::{Job, JobStatus};

/// Errors returned by caller-facing queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] ResultError),
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub busy: bool,
    /// Pending job ids in dequeue order.
    pub pending: Vec<String>,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Job>,
    busy: bool,
}

struct QueueInner {
    state: Mutex<QueueState>,
    driver: PipelineDriver,
}

/// Sequential job queue feeding the pipeline driver.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl JobQueue {
    pub fn new(
        providers: Providers,
        statuses: Arc<dyn StatusStore>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                driver: PipelineDriver::new(providers, statuses, results),
            }),
        }
    }

    fn statuses(&self) -> &Arc<dyn StatusStore> {
        self.inner.driver.statuses()
    }

    fn results(&self) -> &Arc<dyn ResultSink> {
        self.inner.driver.results()
    }

    /// Appends a job to the tail of the pending list and starts draining if idle.
    ///
    /// Must be called within a Tokio runtime.
    pub fn enqueue(&self, id: impl Into<String>, source_url: impl Into<String>) {
        let id = id.into();
        {
            let mut state = self.inner.lock_state();
            state.pending.push_back(Job {
                id: id.clone(),
                source_url: source_url.into(),
                retry_count: 0,
            });
            self.statuses().set(JobStatus::queued(&id));
        }

        metrics::JOBS_SUBMITTED.with_label_values(&["enqueue"]).inc();
        debug!(job_id = %id, "Job enqueued");
        self.inner.kick();
    }

    /// Puts a job at the head of the pending list, replacing any pending
    /// entry with the same id, and starts draining if idle.
    ///
    /// The retry count always restarts at zero.
    pub fn retry(&self, id: impl Into<String>, source_url: impl Into<String>) {
        let id = id.into();
        {
            let mut state = self.inner.lock_state();
            state.pending.retain(|job| job.id != id);
            state.pending.push_front(Job {
                id: id.clone(),
                source_url: source_url.into(),
                retry_count: 0,
            });
            self.statuses().set(JobStatus::queued(&id));
        }

        metrics::JOBS_SUBMITTED.with_label_values(&["retry"]).inc();
        info!(job_id = %id, "Job re-queued for retry");
        self.inner.kick();
    }

    /// Creates a new job for `source_url` and returns its id.
    pub fn submit(&self, source_url: impl Into<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.enqueue(id.clone(), source_url);
        id
    }

    /// Retries a job that already has a stored result, reusing its source URL.
    pub fn resubmit(&self, id: &str) -> Result<(), QueueError> {
        let previous = self
            .results()
            .read(id)?
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        self.retry(id, previous.source_url);
        Ok(())
    }

    /// Latest status of a job, `None` for unknown ids.
    pub fn status(&self, id: &str) -> Option<JobStatus> {
        self.statuses().get(id)
    }

    /// Stored result of a job, if it has started at least once.
    pub fn result(&self, id: &str) -> Result<Option<JobResult>, QueueError> {
        Ok(self.results().read(id)?)
    }

    pub fn list_results(&self, filter: &ResultFilter) -> Result<ResultPage, QueueError> {
        let results = self.results().list(filter)?;
        let total = self.results().count(filter)?;
        Ok(ResultPage {
            results,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    /// Removes every trace of a job: stored result, status and pending entry.
    ///
    /// Returns false when nothing was known about the id.
    pub fn delete(&self, id: &str) -> Result<bool, QueueError> {
        let was_pending = {
            let mut state = self.inner.lock_state();
            let before = state.pending.len();
            state.pending.retain(|job| job.id != id);
            state.pending.len() != before
        };
        let had_result = self.results().delete(id)?;
        let had_status = self.statuses().remove(id);

        if had_result || had_status || was_pending {
            info!(job_id = %id, "Job deleted");
        }
        Ok(had_result || had_status || was_pending)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.lock_state();
        QueueSnapshot {
            busy: state.busy,
            pending: state.pending.iter().map(|job| job.id.clone()).collect(),
        }
    }

    /// Number of jobs waiting to start.
    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock_state().busy
    }
}

impl QueueInner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a drain task unless one is already running.
    fn kick(self: &Arc<Self>) {
        let first = {
            let mut state = self.lock_state();
            if state.busy {
                return;
            }
            state.busy = true;
            match state.pending.pop_front() {
                Some(job) => job,
                None => {
                    state.busy = false;
                    return;
                }
            }
        };

        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.drain(first).await });
    }

    async fn drain(self: Arc<Self>, first: Job) {
        let mut job = first;
        loop {
            self.execute(job).await;

            let next = {
                let mut state = self.lock_state();
                let next = state.pending.pop_front();
                if next.is_none() {
                    state.busy = false;
                }
                next
            };

            match next {
                Some(j) => job = j,
                None => break,
            }
        }
        debug!("Queue drained");
    }

    /// Runs one job in its own task.
    ///
    /// The driver turns stage panics into failed results itself; this only
    /// catches panics that escape it, such as one raised by the result sink.
    async fn execute(&self, job: Job) {
        let driver = self.driver.clone();
        let task_job = job.clone();
        let handle = tokio::spawn(async move {
            // Failures are recorded by the driver itself
            let _ = driver.run(&task_job).await;
        });

        if let Err(e) = handle.await {
            error!(job_id = %job.id, error = %e, "Pipeline task crashed");
            self.record_crash(&job);
        }
    }

    fn record_crash(&self, job: &Job) {
        let mut result =
            JobResult::started(&job.id, &job.source_url, self.driver.model_info());
        if let Ok(Some(existing)) = self.driver.results().read(&job.id) {
            result.created_at = existing.created_at;
        }
        result.status = ResultStatus::Failed;
        result.error = Some(INTERNAL_ERROR.to_string());
        result.updated_at = Utc::now();

        if let Err(e) = self.driver.results().write(&result) {
            error!(job_id = %job.id, error = %e, "Failed to store crash result");
        }
        self.driver
            .statuses()
            .set(JobStatus::failed(&job.id, INTERNAL_ERROR));
        metrics::JOBS_FINISHED.with_label_values(&["panicked"]).inc();
    }
}
