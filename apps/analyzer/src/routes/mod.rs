pub mod health;
pub mod index;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::feedback::handlers as feedback;
use crate::ingest::handlers as ingest;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/", get(index::index_handler))
        .route("/health", get(health::health_handler))
        // Ingest
        .route(
            "/api/v1/resumes/upload",
            post(ingest::handle_upload).layer(upload_limit),
        )
        // Analysis
        .route("/api/v1/analysis", post(analysis::handle_analyze))
        .route("/api/v1/analysis/jd-match", post(analysis::handle_jd_match))
        .route("/api/v1/analysis/tips", post(analysis::handle_tips))
        .route("/api/v1/analysis/export", post(analysis::handle_export))
        // Feedback
        .route("/api/v1/feedback", post(feedback::handle_feedback))
        .with_state(state)
}
