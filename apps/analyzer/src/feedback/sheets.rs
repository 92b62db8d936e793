//! Google Sheets feedback sink.
//!
//! Authenticates as a service account (signed JWT exchanged for an OAuth2
//! access token) and appends one row per record with `values:append`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::feedback::models::FeedbackRecord;
use crate::feedback::sink::{FeedbackSink, SinkError};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields used from a downloaded service-account key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, SinkError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SinkError::Credentials(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| SinkError::Credentials(format!("invalid key file {}: {e}", path.display())))
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct SheetsFeedbackSink {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    append_url: String,
}

impl SheetsFeedbackSink {
    pub fn new(key: ServiceAccountKey, sheet_id: &str, range: &str) -> Result<Self, SinkError> {
        Self::with_api_base(key, sheet_id, range, SHEETS_API_BASE)
    }

    pub fn with_api_base(
        key: ServiceAccountKey,
        sheet_id: &str,
        range: &str,
        api_base: &str,
    ) -> Result<Self, SinkError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SinkError::Credentials(format!("invalid private key: {e}")))?;
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let append_url = format!(
            "{}/v4/spreadsheets/{sheet_id}/values/{range}:append",
            api_base.trim_end_matches('/')
        );

        info!(sheet_id, range, "Feedback sink: Google Sheets");
        Ok(Self {
            client,
            key,
            encoding_key,
            append_url,
        })
    }

    fn signed_assertion(&self) -> Result<String, SinkError> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| SinkError::Credentials(format!("cannot sign assertion: {e}")))
    }

    async fn access_token(&self) -> Result<String, SinkError> {
        let assertion = self.signed_assertion()?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let token: TokenResponse = response.json().await?;
        debug!("Obtained Sheets access token");
        Ok(token.access_token)
    }
}

#[async_trait]
impl FeedbackSink for SheetsFeedbackSink {
    async fn append(&self, record: &FeedbackRecord) -> Result<(), SinkError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(&self.append_url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token)
            .json(&json!({ "values": [record.to_row()] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        info!(origin = %record.origin, "Feedback row appended to sheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mockito::Matcher;

    use super::*;

    const TEST_KEY_PEM: &str = include_str!("testdata/test_service_account_key.pem");

    fn key_for(server: &mockito::ServerGuard) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "feedback@test-project.iam.gserviceaccount.com".to_string(),
            private_key: TEST_KEY_PEM.to_string(),
            token_uri: format!("{}/token", server.url()),
        }
    }

    fn record() -> FeedbackRecord {
        FeedbackRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 5, 6, 7, 8, 9).unwrap(),
            text: "Loved the skill breakdown".to_string(),
            origin: "198.51.100.4".to_string(),
            rating: Some(5),
        }
    }

    #[tokio::test]
    async fn test_append_exchanges_token_then_appends_row() {
        let mut server = mockito::Server::new_async().await;
        let token = server
            .mock("POST", "/token")
            .match_body(Matcher::Regex(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"access_token": "ya29.test", "expires_in": 3599}"#)
            .create_async()
            .await;
        let append = server
            .mock("POST", "/v4/spreadsheets/sheet-123/values/Feedback!A:D:append")
            .match_query(Matcher::UrlEncoded(
                "valueInputOption".to_string(),
                "RAW".to_string(),
            ))
            .match_header("authorization", "Bearer ya29.test")
            .match_body(Matcher::Json(json!({
                "values": [["2025-05-06T07:08:09Z", "Loved the skill breakdown", "198.51.100.4", "5"]]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let sink = SheetsFeedbackSink::with_api_base(
            key_for(&server),
            "sheet-123",
            "Feedback!A:D",
            &server.url(),
        )
        .unwrap();
        sink.append(&record()).await.unwrap();

        token.assert_async().await;
        append.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_rejection_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let sink =
            SheetsFeedbackSink::with_api_base(key_for(&server), "s", "Sheet1!A:D", &server.url())
                .unwrap();
        let err = sink.append(&record()).await.unwrap_err();
        assert!(matches!(err, SinkError::Api { status: 400, .. }));
    }

    #[test]
    fn test_bad_private_key_rejected() {
        let key = ServiceAccountKey {
            client_email: "x@example.com".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: default_token_uri(),
        };
        assert!(matches!(
            SheetsFeedbackSink::new(key, "s", "Sheet1!A:D"),
            Err(SinkError::Credentials(_))
        ));
    }

    #[test]
    fn test_key_file_defaults_token_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sa.json");
        std::fs::write(
            &path,
            r#"{"type": "service_account", "client_email": "a@b.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();

        let key = ServiceAccountKey::from_file(&path).unwrap();
        assert_eq!(key.client_email, "a@b.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_missing_key_file_is_credentials_error() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/sa.json")).unwrap_err();
        assert!(matches!(err, SinkError::Credentials(_)));
    }
}
