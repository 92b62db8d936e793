//! Best-effort lookup of the public network address a submission came from.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

/// Stored when the lookup fails.
pub const UNKNOWN_ORIGIN: &str = "unknown";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup service returned status {0}")]
    Status(u16),

    #[error("lookup service returned an empty body")]
    Empty,
}

#[async_trait]
pub trait OriginLookup: Send + Sync {
    async fn lookup(&self) -> Result<String, NetworkError>;
}

/// Queries a plain-text IP echo service such as `https://api.ipify.org`.
pub struct HttpOriginLookup {
    client: Client,
    url: String,
}

impl HttpOriginLookup {
    pub fn new(url: impl Into<String>) -> Result<Self, NetworkError> {
        let client = Client::builder().timeout(LOOKUP_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl OriginLookup for HttpOriginLookup {
    async fn lookup(&self) -> Result<String, NetworkError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let origin = body.trim();
        if origin.is_empty() {
            return Err(NetworkError::Empty);
        }
        Ok(origin.to_string())
    }
}
