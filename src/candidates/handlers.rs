use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{CandidateListResponse, CandidateQuery, CandidateResponse, SuccessMessage},
    form::ApplicationForm,
    repo_types::Pagination,
    services::{self, DocumentKind, UploadItem},
};
use crate::{
    auth::jwt::HrUser,
    error::{AppError, Result},
    state::AppState,
};

pub const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn candidate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/candidates", get(list_candidates))
        .route("/api/candidates/:id", get(get_candidate).delete(delete_candidate))
        .route("/api/candidates/:id/resume", get(resume))
        .route("/api/candidates/:id/academics", get(academics))
        .route(
            "/upload",
            post(upload_application).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
}

#[instrument(skip(state))]
pub async fn list_candidates(
    State(state): State<AppState>,
    _hr: HrUser,
    Query(query): Query<CandidateQuery>,
) -> Result<Json<CandidateListResponse>> {
    let (page, filter) = query.into_filter()?;
    let (data, total) = services::list_candidates(&state, &filter).await?;
    Ok(Json(CandidateListResponse {
        success: true,
        data,
        pagination: Pagination::new(page, filter.limit, total),
    }))
}

#[instrument(skip(state))]
pub async fn get_candidate(
    State(state): State<AppState>,
    _hr: HrUser,
    Path(id): Path<i64>,
) -> Result<Json<CandidateResponse>> {
    let data = services::get_candidate(&state, id).await?;
    Ok(Json(CandidateResponse { success: true, data }))
}

async fn redirect_to_document(state: &AppState, id: i64, kind: DocumentKind) -> Result<impl IntoResponse> {
    let url = services::document_url(state, id, kind).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

#[instrument(skip(state))]
pub async fn resume(
    State(state): State<AppState>,
    _hr: HrUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    redirect_to_document(&state, id, DocumentKind::Resume).await
}

#[instrument(skip(state))]
pub async fn academics(
    State(state): State<AppState>,
    _hr: HrUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    redirect_to_document(&state, id, DocumentKind::Academics).await
}

#[instrument(skip(state))]
pub async fn delete_candidate(
    State(state): State<AppState>,
    _hr: HrUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessMessage>> {
    services::delete_candidate(&state, id).await?;
    Ok(Json(SuccessMessage::new("Candidate deleted successfully")))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %e, limit = UPLOAD_LIMIT_BYTES, "upload exceeds body limit");
        return AppError::PayloadTooLarge("Upload exceeds the 10 MB limit".into());
    }
    warn!(error = %e, "malformed multipart body");
    AppError::validation(format!("Invalid upload: {}", e.body_text()))
}

#[instrument(skip_all)]
pub async fn upload_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SuccessMessage>)> {
    let mut form: Option<ApplicationForm> = None;
    let mut resume = None;
    let mut academics = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "data" => {
                let text = field.text().await.map_err(bad_multipart)?;
                let parsed = serde_json::from_str(&text).map_err(|e| {
                    warn!(error = %e, "application data is not valid JSON");
                    AppError::validation("Invalid application data")
                })?;
                form = Some(parsed);
            }
            "resume" | "academics" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(bad_multipart)?;
                if body.is_empty() {
                    continue;
                }
                let item = Some(UploadItem { body, content_type });
                if name == "resume" {
                    resume = item;
                } else {
                    academics = item;
                }
            }
            other => warn!(field = %other, "ignoring unexpected upload field"),
        }
    }

    let form = form.ok_or_else(|| AppError::validation("Application data is required"))?;
    let id = services::submit_application(&state, form, resume, academics).await?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessMessage::new("Application submitted successfully").with_id(id)),
    ))
}
