mod analysis;
mod config;
mod db;
mod errors;
mod feedback;
mod ingest;
mod llm_client;
mod notify;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, FeedbackSinkKind};
use crate::db::{create_pool, ensure_feedback_table};
use crate::feedback::origin::HttpOriginLookup;
use crate::feedback::sheets::{ServiceAccountKey, SheetsFeedbackSink};
use crate::feedback::sink::{FeedbackSink, PgFeedbackSink};
use crate::feedback::store::{GateStore, MemoryGateStore, RedisGateStore};
use crate::llm_client::LlmClient;
use crate::notify::{DisabledNotifier, NotificationSink, SmtpNotifier};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        &config.openai_base_url,
        config.llm_timeout,
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let notifier: Arc<dyn NotificationSink> = match &config.email {
        Some(email) => {
            info!(receiver = %email.receiver, "Upload notifications enabled");
            Arc::new(SmtpNotifier::from_config(email)?)
        }
        None => {
            info!("Upload notifications disabled (EMAIL_* not set)");
            Arc::new(DisabledNotifier)
        }
    };

    let feedback_sink = build_feedback_sink(&config).await?;
    let gate_store = build_gate_store(&config).await?;
    let origin = Arc::new(HttpOriginLookup::new(config.ip_lookup_url.clone())?);

    let state = AppState {
        llm,
        config: config.clone(),
        notifier,
        feedback_sink,
        gate_store,
        origin,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_feedback_sink(config: &Config) -> Result<Arc<dyn FeedbackSink>> {
    match config.feedback_sink {
        FeedbackSinkKind::Sheets => {
            let key_path = config
                .google_service_account_json
                .as_deref()
                .context("GOOGLE_SERVICE_ACCOUNT_JSON is required when FEEDBACK_SINK=sheets")?;
            let sheet_id = config
                .feedback_sheet_id
                .as_deref()
                .context("FEEDBACK_SHEET_ID is required when FEEDBACK_SINK=sheets")?;

            let key = ServiceAccountKey::from_file(key_path)?;
            Ok(Arc::new(SheetsFeedbackSink::new(
                key,
                sheet_id,
                &config.feedback_sheet_range,
            )?))
        }
        FeedbackSinkKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required when FEEDBACK_SINK=postgres")?;

            let pool = create_pool(database_url).await?;
            ensure_feedback_table(&pool).await?;
            info!("Feedback sink: PostgreSQL");
            Ok(Arc::new(PgFeedbackSink::new(pool)))
        }
    }
}

async fn build_gate_store(config: &Config) -> Result<Arc<dyn GateStore>> {
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let store = RedisGateStore::connect(&client).await?;
            info!("Feedback cooldown state: Redis");
            Ok(Arc::new(store))
        }
        None => {
            info!("Feedback cooldown state: in-process");
            Ok(Arc::new(MemoryGateStore::new()))
        }
    }
}
