//! Feedback Sink — append-only persistence for feedback records.
//!
//! `AppState` holds an `Arc<dyn FeedbackSink>`, chosen at startup via
//! `FEEDBACK_SINK`: the Google Sheets sink or the Postgres table.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::feedback::models::FeedbackRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Service account error: {0}")]
    Credentials(String),
}

/// Appends one record. Implementations never rewrite or delete earlier rows,
/// so concurrent appends from independent sessions are safe.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn append(&self, record: &FeedbackRecord) -> Result<(), SinkError>;
}

/// Postgres-backed sink. CRITICAL: INSERT only, never UPDATE or DELETE.
pub struct PgFeedbackSink {
    pool: PgPool,
}

impl PgFeedbackSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackSink for PgFeedbackSink {
    async fn append(&self, record: &FeedbackRecord) -> Result<(), SinkError> {
        sqlx::query(
            r#"
            INSERT INTO feedback (submitted_at, text, origin, rating)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(record.timestamp)
        .bind(&record.text)
        .bind(&record.origin)
        .bind(record.rating.map(i16::from))
        .execute(&self.pool)
        .await?;

        info!(origin = %record.origin, "Feedback row inserted");
        Ok(())
    }
}
