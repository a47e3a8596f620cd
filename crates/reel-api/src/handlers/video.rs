//! Video generation handlers.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_models::{Job, JobId, JobStatus, Script};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// Body of both generation endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 2000, message = "query must be between 1 and 2000 characters"))]
    pub query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct ScriptResponse {
    pub script: Script,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassembleResponse {
    pub file_path: PathBuf,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_query(payload: Result<Json<GenerateRequest>, JsonRejection>) -> ApiResult<String> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::Validation("query must not be blank".to_string()));
    }
    Ok(query.to_string())
}

/// Job ids end up in asset file names.
fn parse_job_id(raw: String) -> ApiResult<JobId> {
    let valid = !raw.is_empty()
        && raw.len() <= 64
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ApiError::bad_request("Invalid job id"));
    }
    Ok(JobId::from_string(raw))
}

async fn find_job(state: &AppState, job_id: &JobId) -> ApiResult<Job> {
    state
        .jobs()
        .get(job_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("job {} not found", job_id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a job. Returns immediately; poll the status endpoint for progress.
pub async fn generate_video(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let query = parse_query(payload)?;
    let submitted = state.orchestrator.submit(query).await?;
    info!(job_id = %submitted.job_id, "Accepted video generation request");

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerateResponse {
            job_id: submitted.job_id,
        }),
    ))
}

/// Generate a script synchronously, without creating a job.
pub async fn generate_script(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<ScriptResponse>> {
    let query = parse_query(payload)?;
    let script = state.orchestrator.generate_script(&query).await?;
    Ok(Json(ScriptResponse { script }))
}

/// Job snapshot.
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let job_id = parse_job_id(job_id)?;
    Ok(Json(find_job(&state, &job_id).await?))
}

/// Stream the finished video.
pub async fn download_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job_id = parse_job_id(job_id)?;
    let job = find_job(&state, &job_id).await?;

    let path = match (job.status, job.file_path) {
        (JobStatus::Completed, Some(path)) => path,
        (JobStatus::Failed, _) => {
            return Err(ApiError::conflict(format!(
                "job {} failed: {}",
                job_id,
                job.error_message.unwrap_or_default()
            )))
        }
        _ => {
            return Err(ApiError::conflict(format!(
                "job {} is not complete ({}%)",
                job_id, job.progress
            )))
        }
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(job_id = %job_id, path = %path.display(), "Completed job has no video file");
            return Err(ApiError::not_found("Video file not found"));
        }
        Err(e) => return Err(ApiError::internal(format!("failed to open video: {}", e))),
    };
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("failed to stat video: {}", e)))?
        .len();

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.mp4", job_id));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Rebuild a video from the assets on disk.
pub async fn reassemble_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<ReassembleResponse>> {
    let job_id = parse_job_id(job_id)?;
    let file_path = state.orchestrator.reassemble_from_assets(&job_id).await?;
    info!(job_id = %job_id, path = %file_path.display(), "Reassembled video");
    Ok(Json(ReassembleResponse { file_path }))
}
