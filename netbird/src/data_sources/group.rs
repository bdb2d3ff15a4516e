//! Single group lookup by id or by name

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::value::{Model, Value};

use crate::api::groups::Group;
use crate::api::{ApiError, Client};
use crate::models::GroupModel;
use crate::resources::{api_error_diagnostic, not_configured};
use crate::NetbirdProviderData;

#[derive(Default)]
pub struct GroupDataSource {
    provider_data: Option<NetbirdProviderData>,
}

impl GroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(&self, client: &Client, config: &GroupModel) -> Result<Group, Diagnostic> {
        if let Some(id) = config.id.as_known().filter(|id| !id.is_empty()) {
            return client
                .groups()
                .get(id)
                .await
                .map_err(|e| api_error_diagnostic("get group", &e));
        }

        let name = match config.name.as_known() {
            Some(name) if !name.is_empty() => name,
            _ => return Err(missing_lookup()),
        };

        let groups = client
            .groups()
            .list()
            .await
            .map_err(|e: ApiError| api_error_diagnostic("list groups", &e))?;
        let mut matches = groups.into_iter().filter(|g| &g.name == name);

        match (matches.next(), matches.next()) {
            (Some(group), None) => Ok(group),
            (Some(_), Some(_)) => Err(Diagnostic::error(
                "Ambiguous group name",
                format!("More than one group is named {:?}; look it up by id instead", name),
            )),
            (None, _) => Err(Diagnostic::error(
                "Group not found",
                format!("No group named {:?} exists", name),
            )),
        }
    }
}

#[async_trait]
impl DataSource for GroupDataSource {
    fn type_name(&self) -> &str {
        "netbird_group"
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
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Looks up a NetBird group by id or name")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Group ID")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Group name")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("peers", AttributeType::list_of(AttributeType::String))
                    .description("IDs of the peers in the group")
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
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = vec![];

        if let Ok(config) = GroupModel::from_value(&request.config) {
            let unset = |v: &Value<String>| match v {
                Value::Unknown => false,
                Value::Null => true,
                Value::Known(s) => s.is_empty(),
            };
            if unset(&config.id) && unset(&config.name) {
                diagnostics.push(missing_lookup());
            }
        }

        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let client = match &self.provider_data {
            Some(data) => data.client.as_ref(),
            None => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics: vec![not_configured()],
                }
            }
        };

        let config = match GroupModel::from_value(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                }
            }
        };

        match self.lookup(client, &config).await {
            Ok(group) => ReadDataSourceResponse {
                state: GroupModel::from_api(&group).to_value(),
                diagnostics: vec![],
            },
            Err(diag) => ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics: vec![diag],
            },
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for GroupDataSource {
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

fn missing_lookup() -> Diagnostic {
    Diagnostic::error(
        "Missing group lookup attribute",
        "One of id or name must be set to look up a group",
    )
}
