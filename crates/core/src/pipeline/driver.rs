//! Runs the fixed stage sequence for one job.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::job::{Job, JobStatus, Stage, StatusStore};
use crate::metrics;
use crate::providers::{
    MediaFetcher, MetadataResolver, ProviderError, Summarizer, Transcriber,
};
use crate::results::{JobResult, ModelInfo, ResultSink, ResultStatus, SourceMetadata, StageMetrics};

use super::error::PipelineError;

/// The four external collaborators the pipeline calls, in stage order.
#[derive(Clone)]
pub struct Providers {
    pub resolver: Arc<dyn MetadataResolver>,
    pub fetcher: Arc<dyn MediaFetcher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub summarizer: Arc<dyn Summarizer>,
}

/// Executes jobs one at a time on behalf of the queue.
///
/// The driver is the only writer of job results. Every run ends with exactly
/// one result write followed by a terminal status.
#[derive(Clone)]
pub struct PipelineDriver {
    providers: Providers,
    statuses: Arc<dyn StatusStore>,
    results: Arc<dyn ResultSink>,
}

impl PipelineDriver {
    pub fn new(
        providers: Providers,
        statuses: Arc<dyn StatusStore>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            providers,
            statuses,
            results,
        }
    }

    pub fn statuses(&self) -> &Arc<dyn StatusStore> {
        &self.statuses
    }

    pub fn results(&self) -> &Arc<dyn ResultSink> {
        &self.results
    }

    /// Models reported by the transcriber and summarizer.
    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            transcription: self.providers.transcriber.model().to_string(),
            summarization: self.providers.summarizer.model().to_string(),
        }
    }

    /// Runs every stage for `job` and records the terminal outcome.
    ///
    /// Errors are already recorded in the status store and result sink when
    /// this returns; the return value is informational.
    pub async fn run(&self, job: &Job) -> Result<(), PipelineError> {
        info!(job_id = %job.id, url = %job.source_url, "Starting pipeline");
        let started = Instant::now();

        let mut result = JobResult::started(&job.id, &job.source_url, self.model_info());
        let outcome = AssertUnwindSafe(self.run_stages(job, &mut result))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                error!(
                    job_id = %job.id,
                    panic = %panic_message(payload.as_ref()),
                    "Pipeline stage panicked"
                );
                Err(PipelineError::Panicked)
            });
        result.updated_at = Utc::now();

        match outcome {
            Ok(()) => {
                result.status = ResultStatus::Completed;
                result.error = None;

                if let Err(e) = self.results.write(&result) {
                    let err = PipelineError::Sink(e);
                    error!(job_id = %job.id, error = %err, "Failed to store completed result");
                    self.statuses.set(JobStatus::failed(&job.id, err.to_string()));
                    metrics::JOBS_FINISHED.with_label_values(&["failed"]).inc();
                    return Err(err);
                }

                self.statuses.set(JobStatus::completed(&job.id));
                metrics::JOBS_FINISHED.with_label_values(&["completed"]).inc();
                info!(
                    job_id = %job.id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Pipeline completed"
                );
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                result.status = ResultStatus::Failed;
                result.error = Some(message.clone());

                if let Err(e) = self.results.write(&result) {
                    error!(job_id = %job.id, error = %e, "Failed to store failed result");
                }

                self.statuses.set(JobStatus::failed(&job.id, message));
                metrics::JOBS_FINISHED
                    .with_label_values(&[err.outcome()])
                    .inc();
                warn!(
                    job_id = %job.id,
                    stage = err.stage().map(|s| s.name()).unwrap_or("none"),
                    error = %err,
                    "Pipeline failed"
                );
                Err(err)
            }
        }
    }

    async fn run_stages(&self, job: &Job, result: &mut JobResult) -> Result<(), PipelineError> {
        let id = job.id.as_str();

        self.enter(id, Stage::Resolving);
        let metadata = timed(
            Stage::Resolving,
            &mut result.metrics,
            self.providers.resolver.resolve(&job.source_url),
        )
        .await?;
        result.metadata = Some(SourceMetadata::from(&metadata));

        let media_url = metadata
            .media_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(PipelineError::MediaUnavailable)?;
        result.video_url = Some(media_url.clone());

        self.enter(id, Stage::Downloading);
        let path = timed(
            Stage::Downloading,
            &mut result.metrics,
            self.providers.fetcher.fetch(id, &media_url),
        )
        .await?;

        self.enter(id, Stage::Transcribing);
        let transcription = timed(
            Stage::Transcribing,
            &mut result.metrics,
            self.providers.transcriber.transcribe(&path),
        )
        .await;
        remove_media(id, &path).await;
        let transcript = result.transcript.insert(transcription?);

        self.enter(id, Stage::Summarizing);
        let summary = timed(
            Stage::Summarizing,
            &mut result.metrics,
            self.providers
                .summarizer
                .summarize(&transcript.text, transcript.segments.as_deref()),
        )
        .await?;

        result.summary = Some(summary);
        Ok(())
    }

    fn enter(&self, id: &str, stage: Stage) {
        debug!(job_id = %id, stage = stage.name(), "Entering stage");
        self.statuses.set(JobStatus::stage(id, stage));
    }
}

/// Awaits one stage call, recording its duration whatever the outcome.
async fn timed<T, F>(
    stage: Stage,
    stage_metrics: &mut StageMetrics,
    call: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    let started = Instant::now();
    let outcome = call.await;
    let elapsed = started.elapsed();

    stage_metrics.record(stage, elapsed.as_millis() as u64);
    metrics::STAGE_DURATION
        .with_label_values(&[stage.name(), if outcome.is_ok() { "ok" } else { "error" }])
        .observe(elapsed.as_secs_f64());

    outcome.map_err(|source| PipelineError::Stage { stage, source })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn remove_media(job_id: &str, path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(job_id, path = %path.display(), "Removed temp media"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(job_id, path = %path.display(), "Failed to remove temp media: {}", e),
    }
}
