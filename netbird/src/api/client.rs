use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::error::ApiError;

/// How requests authenticate against the management API
#[derive(Clone, PartialEq)]
pub enum Auth {
    /// Personal access token, sent as `Token <token>`
    Token(String),
    /// OAuth access token, sent as `Bearer <token>`
    Bearer(String),
}

impl Auth {
    pub fn header_value(&self) -> String {
        match self {
            Auth::Token(token) => format!("Token {}", token),
            Auth::Bearer(token) => format!("Bearer {}", token),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            Auth::Token(_) => "Token",
            Auth::Bearer(_) => "Bearer",
        }
    }
}

// Never print the secret itself
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Auth::{}(<redacted>)", self.scheme())
    }
}

/// NetBird management API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
}

impl Client {
    /// Create a client for `server_url`, e.g. `https://api.netbird.io`
    pub fn new(server_url: &str, auth: Auth) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(server_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", server_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                server_url,
                parsed.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!(
                "terraform-provider-netbird/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: server_url.trim_end_matches('/').to_string(),
                auth_header: auth.header_value(),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Groups API operations
    pub fn groups(&self) -> super::groups::GroupsApi<'_> {
        super::groups::GroupsApi::new(self)
    }

    /// Routes API operations
    pub fn routes(&self) -> super::routes::RoutesApi<'_> {
        super::routes::RoutesApi::new(self)
    }

    /// Setup keys API operations
    pub fn setup_keys(&self) -> super::setup_keys::SetupKeysApi<'_> {
        super::setup_keys::SetupKeysApi::new(self)
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("GET request to: {}", url);

        let body = self
            .execute("GET", &url, self.inner.http_client.get(&url))
            .await?;
        decode(&body)
    }

    /// Execute a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("POST request to: {}", url);

        let body = self
            .execute("POST", &url, self.inner.http_client.post(&url).json(body))
            .await?;
        decode(&body)
    }

    /// Execute a PUT request with a JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("PUT request to: {}", url);

        let body = self
            .execute("PUT", &url, self.inner.http_client.put(&url).json(body))
            .await?;
        decode(&body)
    }

    /// Execute a DELETE request; the response body is ignored
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        tracing::debug!("DELETE request to: {}", url);

        self.execute("DELETE", &url, self.inner.http_client.delete(&url))
            .await
            .map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Send once and return the body of a 200 response
    async fn execute(
        &self,
        method: &str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, ApiError> {
        let response = request
            .header(AUTHORIZATION, &self.inner.auth_header)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("{} {} returned {}", method, url, status);

        let body = response.text().await?;
        if status != StatusCode::OK {
            tracing::error!("API error response ({}): {}", status, body);
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}", e);
        ApiError::Parse(e)
    })
}
