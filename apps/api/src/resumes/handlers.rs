//! Axum route handlers for the Resume API.

use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthedProfile;
use crate::errors::AppError;
use crate::resumes::generator::{generate_resume, GenerateRequest};
use crate::resumes::index::{find_record, list_records, remove_record, ResumeRecord};
use crate::routes::success;
use crate::state::AppState;
use crate::storage::keys::{self, ProfileName};

#[derive(Debug, Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeRecord>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub message: String,
    pub resume: ResumeRecord,
}

fn parse_resume_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Resume not found".to_string()))
}

async fn load_resume_html(
    state: &AppState,
    profile: &ProfileName,
    record: &ResumeRecord,
) -> Result<String, AppError> {
    let key = keys::resume_body(profile, &record.filename)?;
    let body = state
        .store
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume file not found".to_string()))?;
    String::from_utf8(body.to_vec())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored resume '{key}' is not UTF-8: {e}")))
}

/// GET /api/v1/resumes
///
/// Most recent first.
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
) -> Result<Json<ResumeListResponse>, AppError> {
    let resumes = list_records(state.store.as_ref(), &profile).await?;
    Ok(Json(ResumeListResponse { resumes }))
}

/// POST /api/v1/resumes
///
/// Generates an AI-tailored resume from the profile and a job description.
pub async fn handle_generate_resume(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    let style_guide = tokio::fs::read_to_string(&state.resume_template_path)
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "resume template {} unreadable: {e}",
                state.resume_template_path.display()
            ))
        })?;

    let resume = generate_resume(
        state.store.as_ref(),
        state.llm.as_ref(),
        &style_guide,
        &profile,
        &request,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            status: "success",
            message: format!("Successfully generated AI-tailored resume \"{}\"", resume.display_name),
            resume,
        }),
    ))
}

/// GET /api/v1/resumes/:id
pub async fn handle_view_resume(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let record = find_record(state.store.as_ref(), &profile, parse_resume_id(&id)?).await?;
    Ok(Html(load_resume_html(&state, &profile, &record).await?))
}

/// GET /api/v1/resumes/:id/pdf
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = find_record(state.store.as_ref(), &profile, parse_resume_id(&id)?).await?;
    let html = load_resume_html(&state, &profile, &record).await?;
    let pdf = state.pdf.render(&html).await?;

    let download_name = format!("{}.pdf", record.filename.trim_end_matches(".html"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{download_name}\""))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("building Content-Disposition: {e}")))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let record = remove_record(state.store.as_ref(), &profile, parse_resume_id(&id)?).await?;
    Ok(success(&format!("Successfully deleted \"{}\"", record.display_name)))
}
