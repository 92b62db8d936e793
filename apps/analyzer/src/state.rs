use std::sync::Arc;

use crate::config::Config;
use crate::feedback::origin::OriginLookup;
use crate::feedback::sink::FeedbackSink;
use crate::feedback::store::GateStore;
use crate::llm_client::LlmClient;
use crate::notify::NotificationSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// Forwards uploaded resumes to the operator. `DisabledNotifier` when email is unset.
    pub notifier: Arc<dyn NotificationSink>,
    /// Append-only feedback storage, chosen via FEEDBACK_SINK.
    pub feedback_sink: Arc<dyn FeedbackSink>,
    /// Per-session cooldown state. In-process unless REDIS_URL is set.
    pub gate_store: Arc<dyn GateStore>,
    pub origin: Arc<dyn OriginLookup>,
}
