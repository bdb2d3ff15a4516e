//! OAuth client-credentials token exchange
//!
//! The credentials live in a local JSON file; the access token obtained from
//! the issuer is sent as a bearer token on every API request.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to read OAuth credentials file {path}: {source}")]
    ReadCredentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse OAuth credentials: {0}")]
    ParseCredentials(#[source] serde_json::Error),

    #[error("OAuth token request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OAuth issuer returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to parse OAuth token response: {0}")]
    ParseResponse(#[source] serde_json::Error),
}

#[derive(Clone, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
    #[serde(default)]
    pub scope: String,
}

fn default_grant_type() -> String {
    "client_credentials".to_string()
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .finish()
    }
}

impl OAuthCredentials {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| AuthError::ReadCredentials {
                    path: path.to_path_buf(),
                    source,
                })?;
        serde_json::from_str(&contents).map_err(AuthError::ParseCredentials)
    }

    /// `application/x-www-form-urlencoded` token request body
    pub fn form_body(&self) -> String {
        [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", self.grant_type.as_str()),
            ("scope", self.scope.as_str()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
    }
}

#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchange client credentials for an access token at `issuer`
pub async fn request_token(
    http_client: &reqwest::Client,
    issuer: &str,
    credentials: &OAuthCredentials,
) -> Result<TokenResponse, AuthError> {
    tracing::debug!(
        "Requesting OAuth token from {} for client {}",
        issuer,
        credentials.client_id
    );

    let response = http_client
        .post(issuer)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .body(credentials.form_body())
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::error!("OAuth issuer error response ({}): {}", status, body);
        return Err(AuthError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(AuthError::ParseResponse)
}

/// Read the credentials file and fetch an access token
pub async fn token_from_credentials_file(
    path: impl AsRef<Path>,
    issuer: &str,
) -> Result<String, AuthError> {
    let credentials = OAuthCredentials::from_file(path).await?;
    let http_client = reqwest::Client::builder()
        .user_agent(concat!(
            "terraform-provider-netbird/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()?;
    let token = request_token(&http_client, issuer, &credentials).await?;
    Ok(token.access_token)
}
