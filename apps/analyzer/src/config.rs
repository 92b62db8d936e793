use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which backend receives feedback rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackSinkKind {
    Sheets,
    Postgres,
}

/// SMTP settings for the upload notification. All three identities must be
/// present for email delivery to be enabled.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_timeout: Duration,
    pub feedback_cooldown: Duration,
    /// How long an issued session id is accepted by the feedback endpoint.
    pub session_ttl: Duration,
    pub feedback_min_chars: usize,
    pub ip_lookup_url: String,
    pub email: Option<EmailConfig>,
    pub feedback_sink: FeedbackSinkKind,
    pub google_service_account_json: Option<PathBuf>,
    pub feedback_sheet_id: Option<String>,
    pub feedback_sheet_range: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let feedback_sink = match optional_env("FEEDBACK_SINK").as_deref() {
            None | Some("sheets") => FeedbackSinkKind::Sheets,
            Some("postgres") => FeedbackSinkKind::Postgres,
            Some(other) => bail!("FEEDBACK_SINK must be 'sheets' or 'postgres', got '{other}'"),
        };

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 60)?),
            feedback_cooldown: Duration::from_secs(parse_env("FEEDBACK_COOLDOWN_SECS", 300)?),
            session_ttl: Duration::from_secs(parse_env("SESSION_TTL_SECS", 24 * 60 * 60)?),
            feedback_min_chars: parse_env("FEEDBACK_MIN_CHARS", 10)?,
            ip_lookup_url: optional_env("IP_LOOKUP_URL")
                .unwrap_or_else(|| "https://api.ipify.org".to_string()),
            email: email_from_env()?,
            feedback_sink,
            google_service_account_json: optional_env("GOOGLE_SERVICE_ACCOUNT_JSON")
                .map(PathBuf::from),
            feedback_sheet_id: optional_env("FEEDBACK_SHEET_ID"),
            feedback_sheet_range: optional_env("FEEDBACK_SHEET_RANGE")
                .unwrap_or_else(|| "Sheet1!A:D".to_string()),
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn email_from_env() -> Result<Option<EmailConfig>> {
    let (Some(sender), Some(password), Some(receiver)) = (
        optional_env("EMAIL_SENDER"),
        optional_env("EMAIL_PASSWORD"),
        optional_env("EMAIL_RECEIVER"),
    ) else {
        return Ok(None);
    };

    Ok(Some(EmailConfig {
        sender,
        password,
        receiver,
        smtp_host: optional_env("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
        smtp_port: parse_env("SMTP_PORT", 465)?,
    }))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:9".to_string(),
        llm_timeout: Duration::from_secs(5),
        feedback_cooldown: Duration::from_secs(300),
        session_ttl: Duration::from_secs(3600),
        feedback_min_chars: 10,
        ip_lookup_url: "http://127.0.0.1:9".to_string(),
        email: None,
        feedback_sink: FeedbackSinkKind::Sheets,
        google_service_account_json: None,
        feedback_sheet_id: None,
        feedback_sheet_range: "Sheet1!A:D".to_string(),
        database_url: None,
        redis_url: None,
        max_upload_bytes: 1024 * 1024,
        port: 8080,
        rust_log: "info".to_string(),
    }
}
