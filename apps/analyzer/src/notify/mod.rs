//! Operator notification for uploaded resumes.
//!
//! `AppState` holds an `Arc<dyn NotificationSink>`: `SmtpNotifier` when email
//! settings are present, otherwise `DisabledNotifier`.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub mod smtp;

pub use smtp::SmtpNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mailbox '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("could not build message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Delivers a copy of an uploaded file to the operator.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, bytes: &[u8], filename: &str) -> Result<(), NotifyError>;
}

/// Used when no email settings are configured. Always succeeds.
pub struct DisabledNotifier;

#[async_trait]
impl NotificationSink for DisabledNotifier {
    async fn notify(&self, bytes: &[u8], filename: &str) -> Result<(), NotifyError> {
        debug!(
            filename,
            size = bytes.len(),
            "Upload notification skipped (email not configured)"
        );
        Ok(())
    }
}
