//! Axum route handlers for the Analysis API.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::export::export_csv;
use crate::analysis::sections::{analyze, improvement_tips, match_job_description, AnalysisReport};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct JdMatchRequest {
    pub resume_text: String,
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct JdMatchResponse {
    pub result: String,
}

#[derive(Debug, Serialize)]
pub struct TipsResponse {
    pub suggestions: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub resume_text: String,
    #[serde(default)]
    pub job_suggestions: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis
///
/// Runs every automatic section. Section failures are reported inline so the
/// rest of the report stays usable.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    require_text("resume_text", &request.resume_text)?;
    Ok(Json(analyze(&state.llm, &request.resume_text).await))
}

/// POST /api/v1/analysis/jd-match
pub async fn handle_jd_match(
    State(state): State<AppState>,
    Json(request): Json<JdMatchRequest>,
) -> Result<Json<JdMatchResponse>, AppError> {
    require_text("resume_text", &request.resume_text)?;
    require_text("jd_text", &request.jd_text)?;

    let result = match_job_description(&state.llm, &request.resume_text, &request.jd_text).await?;
    Ok(Json(JdMatchResponse { result }))
}

/// POST /api/v1/analysis/tips
pub async fn handle_tips(
    State(state): State<AppState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<TipsResponse>, AppError> {
    require_text("resume_text", &request.resume_text)?;

    let suggestions = improvement_tips(&state.llm, &request.resume_text).await?;
    Ok(Json(TipsResponse { suggestions }))
}

/// POST /api/v1/analysis/export
///
/// Returns a one-row CSV summary as a download.
pub async fn handle_export(Json(request): Json<ExportRequest>) -> Result<Response, AppError> {
    require_text("resume_text", &request.resume_text)?;

    let body = export_csv(
        &request.resume_text,
        &request.job_suggestions,
        &request.skills,
        chrono::Utc::now(),
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"resume_analysis.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
