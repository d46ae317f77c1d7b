use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{dto::CreateJobRequest, repo_types::JobPosting};
use crate::{
    auth::{dto::MessageResponse, jwt::HrUser},
    error::{AppError, Result},
    extract::ApiJson,
    state::AppState,
};

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/api/jobs", get(list_jobs).post(create_job))
        .route("/api/jobs/:id", get(get_job).delete(delete_job))
}

#[instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobPosting>>> {
    let jobs = state
        .jobs
        .list()
        .await
        .map_err(AppError::internal("Failed to fetch jobs"))?;
    Ok(Json(jobs))
}

#[instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobPosting>> {
    state
        .jobs
        .get(id)
        .await
        .map_err(AppError::internal("Failed to fetch job"))?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Job not found"))
}

#[instrument(skip(state, payload))]
pub async fn create_job(
    State(state): State<AppState>,
    _hr: HrUser,
    ApiJson(payload): ApiJson<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobPosting>)> {
    let job = payload.validate().map_err(|e| {
        warn!(error = %e, "invalid job posting");
        e
    })?;
    let created = state
        .jobs
        .create(job)
        .await
        .map_err(AppError::internal("Failed to post job"))?;
    info!(job_id = created.id, title = %created.job_title, "job posted");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    _hr: HrUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let deleted = state
        .jobs
        .delete(id)
        .await
        .map_err(AppError::internal("Failed to delete job"))?;
    if !deleted {
        return Err(AppError::not_found("Job not found"));
    }
    info!(job_id = id, "job deleted");
    Ok(Json(MessageResponse::new("Job deleted successfully")))
}
