//! Axum route handler for feedback submission.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::gate::GateDecision;
use crate::feedback::models::FeedbackRecord;
use crate::feedback::origin::UNKNOWN_ORIGIN;
use crate::feedback::store::StoreError;
use crate::feedback::validation::{validate, FeedbackRules};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    /// Issued by the upload endpoint.
    pub session_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub timestamp: String,
}

/// POST /api/v1/feedback
///
/// The cooldown window is reserved atomically before anything else, then
/// handed back if the submission is invalid or could not be stored. Only a
/// stored record keeps the window.
pub async fn handle_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let session_id = request.session_id;
    let now = Utc::now();

    let decision = state
        .gate_store
        .try_accept(session_id, now, state.config.feedback_cooldown)
        .await
        .map_err(|e| match e {
            StoreError::UnknownSession(_) => {
                AppError::Validation("Unknown or expired session; upload a resume first".to_string())
            }
            other => AppError::Internal(other.into()),
        })?;

    if let GateDecision::Rejected { retry_after } = decision {
        info!(%session_id, ?retry_after, "Feedback rejected by cooldown");
        return Err(AppError::TooManyRequests { retry_after });
    }

    match store_feedback(&state, &request, now).await {
        Ok(record) => {
            info!(%session_id, rating = ?record.rating, "Feedback accepted");
            Ok((
                StatusCode::CREATED,
                Json(FeedbackResponse {
                    timestamp: record.timestamp_iso(),
                }),
            ))
        }
        Err(e) => {
            if let Err(release_err) = state.gate_store.release(session_id, now).await {
                warn!(%session_id, "Could not release cooldown window: {release_err}");
            }
            Err(e)
        }
    }
}

async fn store_feedback(
    state: &AppState,
    request: &FeedbackRequest,
    now: DateTime<Utc>,
) -> Result<FeedbackRecord, AppError> {
    let rules = FeedbackRules {
        min_chars: state.config.feedback_min_chars,
    };
    validate(&request.text, request.rating, &rules)
        .map_err(|reason| AppError::Validation(reason.to_string()))?;

    let origin = match state.origin.lookup().await {
        Ok(origin) => origin,
        Err(e) => {
            warn!(session_id = %request.session_id, "Origin lookup failed, storing '{UNKNOWN_ORIGIN}': {e}");
            UNKNOWN_ORIGIN.to_string()
        }
    };

    // validate() has already bounded the rating to 1..=5.
    let rating = request.rating.and_then(|r| u8::try_from(r).ok());
    let record = FeedbackRecord {
        timestamp: now,
        text: request.text.trim().to_string(),
        origin,
        rating,
    };

    state.feedback_sink.append(&record).await?;
    Ok(record)
}
