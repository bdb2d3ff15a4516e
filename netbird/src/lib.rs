//! Terraform provider for the NetBird network-management API

pub mod api;
pub mod auth;
pub mod config;
pub mod data_sources;
pub mod models;
pub mod provider_data;
pub mod resources;

pub use provider_data::NetbirdProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::types::Diagnostic;

use crate::api::{Auth, Client};
use crate::config::{AuthMode, ProviderConfig};

#[derive(Default)]
pub struct NetbirdProvider;

impl NetbirdProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for NetbirdProvider {
    fn type_name(&self) -> &str {
        "netbird"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: config::provider_schema(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match ProviderConfig::resolve(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        let auth = match &config.auth {
            AuthMode::Token(token) => Auth::Token(token.clone()),
            AuthMode::OAuth {
                credentials_path,
                issuer,
            } => match auth::token_from_credentials_file(credentials_path, issuer).await {
                Ok(token) => Auth::Bearer(token),
                Err(e) => {
                    return ConfigureProviderResponse {
                        diagnostics: vec![Diagnostic::error(
                            "Failed to obtain OAuth access token",
                            e.to_string(),
                        )],
                        provider_data: None,
                    }
                }
            },
        };
        let scheme = auth.scheme();

        match Client::new(&config.server_url, auth) {
            Ok(client) => {
                tracing::info!(
                    "Configured NetBird provider for {} using {} authentication",
                    client.base_url(),
                    scheme
                );
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(NetbirdProviderData::new(client))),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                )],
                provider_data: None,
            },
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert("netbird_group".to_string(), || {
            Box::new(resources::GroupResource::new()) as Box<dyn ResourceWithConfigure>
        });
        factories.insert("netbird_route".to_string(), || {
            Box::new(resources::RouteResource::new()) as Box<dyn ResourceWithConfigure>
        });
        factories.insert("netbird_setup_key".to_string(), || {
            Box::new(resources::SetupKeyResource::new()) as Box<dyn ResourceWithConfigure>
        });
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert("netbird_group".to_string(), || {
            Box::new(data_sources::GroupDataSource::new()) as Box<dyn DataSourceWithConfigure>
        });
        factories.insert("netbird_groups".to_string(), || {
            Box::new(data_sources::GroupsDataSource::new()) as Box<dyn DataSourceWithConfigure>
        });
        factories
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use tfplug::resource::Resource;
    use tfplug::types::DynamicValue;

    async fn configure(config: serde_json::Value) -> ConfigureProviderResponse {
        let mut provider = NetbirdProvider::new();
        provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    config: DynamicValue::from_json(config),
                },
            )
            .await
    }

    #[tokio::test]
    #[serial]
    async fn token_config_produces_provider_data() {
        std::env::remove_var(config::ENV_OAUTH_CREDENTIALS);
        let response = configure(json!({
            "server_url": "https://netbird.example.com/",
            "token_auth": "nbp_123"
        }))
        .await;

        assert!(response.diagnostics.is_empty());
        let data = response.provider_data.unwrap();
        let data = data.downcast_ref::<NetbirdProviderData>().unwrap();
        assert_eq!(data.client.base_url(), "https://netbird.example.com");
    }

    #[tokio::test]
    #[serial]
    async fn oauth_failure_does_not_fall_back_to_token() {
        let response = configure(json!({
            "token_auth": "nbp_123",
            "oauth_credentials": "/nonexistent/creds.json",
            "oauth_issuer": "http://127.0.0.1:1/token"
        }))
        .await;

        assert!(response.provider_data.is_none());
        assert_eq!(response.diagnostics[0].summary, "Failed to obtain OAuth access token");
    }

    #[test]
    fn registers_resources_and_data_sources() {
        let provider = NetbirdProvider::new();

        let mut resources: Vec<_> = provider.resources().into_keys().collect();
        resources.sort();
        assert_eq!(
            resources,
            vec!["netbird_group", "netbird_route", "netbird_setup_key"]
        );

        let mut data_sources: Vec<_> = provider.data_sources().into_keys().collect();
        data_sources.sort();
        assert_eq!(data_sources, vec!["netbird_group", "netbird_groups"]);

        for (name, factory) in provider.resources() {
            assert_eq!(factory().type_name(), name);
        }
    }
}
