//! Group resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::value::Model;
use tfplug::validator::StringLengthBetween;

use super::{api_error_diagnostic, not_configured};
use crate::api::Client;
use crate::models::GroupModel;
use crate::NetbirdProviderData;

#[derive(Default)]
pub struct GroupResource {
    provider_data: Option<NetbirdProviderData>,
}

impl GroupResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&Client, Diagnostic> {
        self.provider_data
            .as_ref()
            .map(|data| data.client.as_ref())
            .ok_or_else(not_configured)
    }
}

#[async_trait]
impl Resource for GroupResource {
    fn type_name(&self) -> &str {
        "netbird_group"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a NetBird peer group")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Group ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Group name")
                    .required()
                    .validator(StringLengthBetween::new(1, 255))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("peers", AttributeType::list_of(AttributeType::String))
                    .description("IDs of the peers in the group")
                    .optional()
                    .computed()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(
        &self,
        _ctx: Context,
        request: CreateResourceRequest,
    ) -> CreateResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![diag],
                }
            }
        };

        let plan = match GroupModel::from_value(&request.planned_state) {
            Ok(plan) => plan,
            Err(diagnostics) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
        };

        match client.groups().create(&plan.to_request()).await {
            Ok(group) => {
                tracing::debug!("Created group {}", group.id);
                CreateResourceResponse {
                    new_state: GroupModel::from_api(&group).to_value(),
                    diagnostics: vec![],
                }
            }
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![api_error_diagnostic("create group", &e)],
            },
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics: vec![diag],
                }
            }
        };

        let id = match group_id(&request.current_state) {
            Ok(id) => id,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        };

        match client.groups().get(&id).await {
            Ok(group) => ReadResourceResponse {
                new_state: Some(GroupModel::from_api(&group).to_value()),
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![api_error_diagnostic("get group", &e)],
            },
        }
    }

    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics: vec![diag],
                }
            }
        };

        let (id, plan) = match group_id(&request.prior_state)
            .and_then(|id| GroupModel::from_value(&request.planned_state).map(|p| (id, p)))
        {
            Ok(decoded) => decoded,
            Err(diagnostics) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        };

        match client.groups().update(&id, &plan.to_request()).await {
            Ok(group) => UpdateResourceResponse {
                new_state: GroupModel::from_api(&group).to_value(),
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![api_error_diagnostic("update group", &e)],
            },
        }
    }

    async fn delete(
        &self,
        _ctx: Context,
        request: DeleteResourceRequest,
    ) -> DeleteResourceResponse {
        let client = match self.client() {
            Ok(client) => client,
            Err(diag) => {
                return DeleteResourceResponse {
                    diagnostics: vec![diag],
                }
            }
        };

        let id = match group_id(&request.prior_state) {
            Ok(id) => id,
            Err(diagnostics) => return DeleteResourceResponse { diagnostics },
        };

        let diagnostics = match client.groups().delete(&id).await {
            Ok(()) => vec![],
            Err(e) => vec![api_error_diagnostic("delete group", &e)],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for GroupResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match NetbirdProviderData::from_configured(request.provider_data) {
            Ok(data) => self.provider_data = data,
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}

fn group_id(state: &DynamicValue) -> Result<String, Vec<Diagnostic>> {
    let model = GroupModel::from_value(state)?;
    model
        .id
        .into_known()
        .ok_or_else(|| vec![Diagnostic::error("Missing group id", "State has no group id")])
}
