//! Setup key API: `/api/setup-keys`
//!
//! Setup keys are never deleted through the API; they are revoked with an
//! update instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApiError, Client};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupKey {
    pub id: String,
    pub key: String,
    pub name: String,
    pub expires: DateTime<Utc>,
    #[serde(rename = "type")]
    pub key_type: String,
    pub valid: bool,
    pub revoked: bool,
    pub used_times: i64,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    pub state: String,
    #[serde(default)]
    pub auto_groups: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
    pub usage_limit: i64,
    #[serde(default)]
    pub ephemeral: bool,
}

/// Request body for POST /api/setup-keys
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSetupKeyRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub expires_in: i64,
    pub auto_groups: Vec<String>,
    pub usage_limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
}

/// Request body for PUT /api/setup-keys/{id}
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupKeyRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub expires_in: i64,
    pub auto_groups: Vec<String>,
    pub usage_limit: i64,
    pub revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
}

/// Setup keys API for setup key operations
pub struct SetupKeysApi<'a> {
    client: &'a Client,
}

impl<'a> SetupKeysApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/setup-keys/{id}
    pub async fn get(&self, id: &str) -> Result<SetupKey, ApiError> {
        self.client.get(&setup_key_path(id)).await
    }

    /// POST /api/setup-keys
    pub async fn create(&self, request: &CreateSetupKeyRequest) -> Result<SetupKey, ApiError> {
        self.client.post("/api/setup-keys", request).await
    }

    /// PUT /api/setup-keys/{id}
    pub async fn update(&self, id: &str, request: &SetupKeyRequest) -> Result<SetupKey, ApiError> {
        self.client.put(&setup_key_path(id), request).await
    }
}

fn setup_key_path(id: &str) -> String {
    format!("/api/setup-keys/{}", urlencoding::encode(id))
}
