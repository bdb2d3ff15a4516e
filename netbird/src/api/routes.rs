//! Route API: `/api/routes`

use serde::{Deserialize, Serialize};

use super::{ApiError, Client};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub network_type: String,
    pub description: String,
    pub network_id: String,
    pub enabled: bool,
    #[serde(default)]
    pub peer: Option<String>,
    #[serde(default)]
    pub peer_groups: Option<Vec<String>>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub domains: Option<Vec<String>>,
    pub metric: i64,
    pub masquerade: bool,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub keep_route: bool,
}

/// Request body for POST and PUT
///
/// The optional routing target fields are left out of the JSON entirely
/// when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRequest {
    pub description: String,
    pub network_id: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    pub metric: i64,
    pub masquerade: bool,
    pub groups: Vec<String>,
    pub keep_route: bool,
}

/// Routes API for route operations
pub struct RoutesApi<'a> {
    client: &'a Client,
}

impl<'a> RoutesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/routes
    pub async fn list(&self) -> Result<Vec<Route>, ApiError> {
        self.client.get("/api/routes").await
    }

    /// GET /api/routes/{id}
    pub async fn get(&self, id: &str) -> Result<Route, ApiError> {
        self.client.get(&route_path(id)).await
    }

    /// POST /api/routes
    pub async fn create(&self, request: &RouteRequest) -> Result<Route, ApiError> {
        self.client.post("/api/routes", request).await
    }

    /// PUT /api/routes/{id}
    pub async fn update(&self, id: &str, request: &RouteRequest) -> Result<Route, ApiError> {
        self.client.put(&route_path(id), request).await
    }

    /// DELETE /api/routes/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&route_path(id)).await
    }
}

fn route_path(id: &str) -> String {
    format!("/api/routes/{}", urlencoding::encode(id))
}
