//! Reel ingestion and result API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use reeldigest_core::{
    is_supported_source, JobResult, JobStatus, QueueError, ResultFilter, ResultPage, ResultStatus,
};

use crate::state::AppState;

/// Maximum allowed limit for result listings
const MAX_LIMIT: i64 = 100;

/// Default limit for result listings
const DEFAULT_LIMIT: i64 = 20;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for ingesting a reel
#[derive(Debug, Deserialize)]
pub struct IngestBody {
    pub url: Option<String>,
}

/// Query parameters for listing results
#[derive(Debug, Deserialize)]
pub struct ListReelsParams {
    /// Filter by terminal status (`completed` or `failed`)
    pub status: Option<String>,
    /// Case-insensitive text search
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response for ingest and retry
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for delete
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error(err: QueueError) -> ApiError {
    error!("Queue operation failed: {}", err);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Job not found")
}

// ============================================================================
// Handlers
// ============================================================================

/// Queue a reel URL for processing
pub async fn ingest_reel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IngestBody>,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    let url = body
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "URL is required"))?;

    if !is_supported_source(&url) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid Instagram URL",
        ));
    }

    let id = state.queue().submit(&url);
    info!(job_id = %id, url = %url, "Reel queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            id,
            status: "queued".to_string(),
            message: None,
        }),
    ))
}

/// Current status of a job
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state.queue().status(&id).map(Json).ok_or_else(not_found)
}

/// Stored result of a job
pub async fn get_reel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResult>, ApiError> {
    state
        .queue()
        .result(&id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(not_found)
}

/// List stored results, newest first
pub async fn list_reels(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListReelsParams>,
) -> Result<Json<ResultPage>, ApiError> {
    let mut filter = ResultFilter::new()
        .with_limit(params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
        .with_offset(params.offset.unwrap_or(0).max(0));

    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
        let status = ResultStatus::parse(status).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid status filter: {}", status),
            )
        })?;
        filter = filter.with_status(status);
    }

    if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
        filter = filter.with_search(search);
    }

    state
        .queue()
        .list_results(&filter)
        .map(Json)
        .map_err(internal_error)
}

/// Re-run a job from the first stage
pub async fn retry_reel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<QueuedResponse>, ApiError> {
    match state.queue().resubmit(&id) {
        Ok(()) => Ok(Json(QueuedResponse {
            id,
            status: "queued".to_string(),
            message: Some("Job re-queued for processing".to_string()),
        })),
        Err(QueueError::NotFound(_)) => Err(not_found()),
        Err(e) => Err(internal_error(e)),
    }
}

/// Delete a job's result and status
pub async fn delete_reel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    if state.queue().delete(&id).map_err(internal_error)? {
        Ok(Json(DeletedResponse {
            id,
            message: "Reel deleted".to_string(),
        }))
    } else {
        Err(not_found())
    }
}
