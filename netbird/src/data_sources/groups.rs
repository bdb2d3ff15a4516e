//! All groups of the account

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

use crate::models::group::group_summary;
use crate::resources::{api_error_diagnostic, not_configured};
use crate::NetbirdProviderData;

#[derive(Default)]
pub struct GroupsDataSource {
    provider_data: Option<NetbirdProviderData>,
}

impl GroupsDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for GroupsDataSource {
    fn type_name(&self) -> &str {
        "netbird_groups"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let peer = AttributeType::object([("id", AttributeType::String)]);
        let group = AttributeType::object([
            ("id", AttributeType::String),
            ("name", AttributeType::String),
            ("peers", AttributeType::list_of(peer)),
        ]);

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists every NetBird group of the account")
            .attribute(
                AttributeBuilder::new("groups", AttributeType::list_of(group))
                    .description("Groups with their id, name and peers")
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let client = match &self.provider_data {
            Some(data) => data.client.as_ref(),
            None => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![not_configured()],
                }
            }
        };

        match client.groups().list().await {
            Ok(groups) => {
                tracing::debug!("Read {} groups", groups.len());
                let mut state = DynamicValue::object();
                let summaries = groups.iter().map(group_summary).collect();
                let diagnostics = match state.set(&AttributePath::new("groups"), Dynamic::List(summaries)) {
                    Ok(()) => vec![],
                    Err(e) => vec![tfplug::types::Diagnostic::error(
                        "Failed to build state",
                        e.to_string(),
                    )],
                };
                ReadDataSourceResponse { state, diagnostics }
            }
            Err(e) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![api_error_diagnostic("get groups", &e)],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for GroupsDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match NetbirdProviderData::from_configured(request.provider_data) {
            Ok(data) => self.provider_data = data,
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
