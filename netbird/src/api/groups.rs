//! Group API: `/api/groups`

use serde::{Deserialize, Serialize};

use super::{ApiError, Client};

/// Peer reference embedded in a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMinimum {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub peers_count: i64,
    #[serde(default)]
    pub peers: Option<Vec<PeerMinimum>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
}

impl Group {
    pub fn peer_ids(&self) -> Vec<String> {
        self.peers
            .iter()
            .flatten()
            .map(|peer| peer.id.clone())
            .collect()
    }
}

/// Request body for POST and PUT
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<String>>,
}

/// Groups API for group operations
pub struct GroupsApi<'a> {
    client: &'a Client,
}

impl<'a> GroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/groups
    pub async fn list(&self) -> Result<Vec<Group>, ApiError> {
        self.client.get("/api/groups").await
    }

    /// GET /api/groups/{id}
    pub async fn get(&self, id: &str) -> Result<Group, ApiError> {
        self.client.get(&group_path(id)).await
    }

    /// POST /api/groups
    pub async fn create(&self, request: &GroupRequest) -> Result<Group, ApiError> {
        self.client.post("/api/groups", request).await
    }

    /// PUT /api/groups/{id}
    pub async fn update(&self, id: &str, request: &GroupRequest) -> Result<Group, ApiError> {
        self.client.put(&group_path(id), request).await
    }

    /// DELETE /api/groups/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&group_path(id)).await
    }
}

fn group_path(id: &str) -> String {
    format!("/api/groups/{}", urlencoding::encode(id))
}
