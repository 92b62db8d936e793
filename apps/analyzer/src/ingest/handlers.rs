//! Axum route handlers for resume upload.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::document::{DocumentFormat, UploadedDocument};
use crate::ingest::extractor::{extract, DecodeError};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Identifies the session for feedback rate limiting. Registered before it is returned.
    pub session_id: Uuid,
    pub filename: String,
    pub format: DocumentFormat,
    pub text: String,
}

/// POST /api/v1/resumes/upload
///
/// Extracts the resume text, then forwards a copy of the original file to the
/// operator. A notification failure is logged and does not fail the upload.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let document = read_document(&mut multipart).await?;
    info!(
        filename = %document.filename,
        format = ?document.format,
        size = document.bytes.len(),
        "Resume uploaded"
    );

    let for_extraction = document.clone();
    let text = tokio::task::spawn_blocking(move || extract(&for_extraction))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task failed: {e}")))??;

    if let Err(e) = state
        .notifier
        .notify(&document.bytes, &document.filename)
        .await
    {
        warn!(filename = %document.filename, "Upload notification failed: {e}");
    }

    let session_id = Uuid::new_v4();
    state
        .gate_store
        .open_session(session_id, state.config.session_ttl)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(UploadResponse {
        session_id,
        filename: document.filename,
        format: document.format,
        text,
    }))
}

async fn read_document(multipart: &mut Multipart) -> Result<UploadedDocument, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename".to_string()))?;

        // Reject the extension before buffering the body.
        if DocumentFormat::from_filename(&filename).is_none() {
            return Err(DecodeError::UnsupportedFormat(filename).into());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read uploaded file: {e}")))?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        return Ok(UploadedDocument::new(bytes, filename)?);
    }

    Err(AppError::Validation(format!(
        "No '{FILE_FIELD}' field in upload"
    )))
}
