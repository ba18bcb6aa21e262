use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    Json,
};
use serde::Deserialize;

use crate::common::ApiResponse;
use crate::domains::watch_jobs::{Job, JobInput, RunStatus};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Body of delete requests
#[derive(Debug, Deserialize)]
pub struct IdBody {
    pub id: i64,
}

pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<JobInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let Json(input) = payload?;
    let job = state
        .engine
        .create(input)
        .await
        .map_err(|e| ApiError::engine("Failed to add job", e))?;
    Ok(Json(ApiResponse::ok("Job added", job)))
}

pub async fn update_job_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<JobInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let Json(input) = payload?;
    let job = state
        .engine
        .update(input)
        .await
        .map_err(|e| ApiError::engine("Failed to update job", e))?;
    Ok(Json(ApiResponse::ok("Job updated", job)))
}

pub async fn delete_job_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(body) = payload?;
    state
        .engine
        .delete(body.id)
        .await
        .map_err(|e| ApiError::engine("Failed to delete job", e))?;
    Ok(Json(ApiResponse::message("Job deleted")))
}

pub async fn list_jobs_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<Vec<Job>>>, ApiError> {
    let jobs = state
        .engine
        .list_jobs()
        .await
        .map_err(|e| ApiError::engine("Failed to list jobs", e))?;
    Ok(Json(ApiResponse::ok("Jobs listed", jobs)))
}

pub async fn pause_job_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state
        .engine
        .set_run_status(id, RunStatus::Stopped)
        .await
        .map_err(|e| ApiError::engine("Failed to pause job", e))?;
    Ok(Json(ApiResponse::ok("Job paused", job)))
}

pub async fn resume_job_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state
        .engine
        .set_run_status(id, RunStatus::Running)
        .await
        .map_err(|e| ApiError::engine("Failed to resume job", e))?;
    Ok(Json(ApiResponse::ok("Job resumed", job)))
}
