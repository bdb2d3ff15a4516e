//! Setup key resource implementation
//!
//! The API has no delete for setup keys: destroying the resource revokes the
//! key and detaches its auto groups instead.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::{Int64AtLeast, StringOneOf};
use tfplug::value::Model;

use super::{api_error_diagnostic, not_configured};
use crate::api::Client;
use crate::models::SetupKeyModel;
use crate::NetbirdProviderData;

#[derive(Default)]
pub struct SetupKeyResource {
    provider_data: Option<NetbirdProviderData>,
}

impl SetupKeyResource {
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
impl Resource for SetupKeyResource {
    fn type_name(&self) -> &str {
        "netbird_setup_key"
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
            .description("Manages a NetBird setup key used to enroll peers")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Setup Key ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Setup Key name")
                    .required()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Setup key type, one-off for single time usage and reusable")
                    .required()
                    .validator(StringOneOf::new(["reusable", "one-off"]))
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("expires_in", AttributeType::Number)
                    .description("Expiration time in seconds, 0 never expires")
                    .optional()
                    .validator(Int64AtLeast::new(0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("rotation_id", AttributeType::String)
                    .description("Arbitrary value; changing it has no effect on the key itself")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("usage_limit", AttributeType::Number)
                    .description("A number of times this key can be used. The value of 0 indicates the unlimited usage.")
                    .optional()
                    .computed()
                    .validator(Int64AtLeast::new(0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ephemeral", AttributeType::Bool)
                    .description("Indicate that the peer will be ephemeral or not")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auto_groups", AttributeType::list_of(AttributeType::String))
                    .description("List of group IDs to auto-assign to peers registered with this key")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("revoked", AttributeType::Bool)
                    .description("Setup key revocation status")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("key", AttributeType::String)
                    .description("Setup Key value")
                    .computed()
                    .sensitive()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("state", AttributeType::String)
                    .description("Setup key status, \"valid\", \"overused\",\"expired\" or \"revoked\"")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("valid", AttributeType::Bool)
                    .description("Setup key validity status")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("used_times", AttributeType::Number)
                    .description("Usage count of setup key")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("last_used", AttributeType::String)
                    .description("Setup key last usage date")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("expires", AttributeType::String)
                    .description("Setup Key expiration date")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .description("Setup key last update date")
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

        let plan = match SetupKeyModel::from_value(&request.planned_state) {
            Ok(plan) => plan,
            Err(diagnostics) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
        };

        match client.setup_keys().create(&plan.to_create_request()).await {
            Ok(key) => {
                tracing::debug!("Created {} setup key {}", key.key_type, key.id);
                CreateResourceResponse {
                    new_state: SetupKeyModel::from_api(&key)
                        .with_write_only_from(&plan)
                        .to_value(),
                    diagnostics: vec![],
                }
            }
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![api_error_diagnostic("create setup key", &e)],
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

        let (id, current) = match decode_with_id(&request.current_state) {
            Ok(decoded) => decoded,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        };

        match client.setup_keys().get(&id).await {
            Ok(key) => ReadResourceResponse {
                new_state: Some(
                    SetupKeyModel::from_api(&key)
                        .with_write_only_from(&current)
                        .to_value(),
                ),
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![api_error_diagnostic("get setup key", &e)],
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

        let (id, plan) = match decode_with_id(&request.prior_state).and_then(|(id, _)| {
            SetupKeyModel::from_value(&request.planned_state).map(|plan| (id, plan))
        }) {
            Ok(decoded) => decoded,
            Err(diagnostics) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        };

        match client
            .setup_keys()
            .update(&id, &plan.to_update_request())
            .await
        {
            Ok(key) => UpdateResourceResponse {
                new_state: SetupKeyModel::from_api(&key)
                    .with_write_only_from(&plan)
                    .to_value(),
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![api_error_diagnostic("update setup key", &e)],
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

        let (id, prior) = match decode_with_id(&request.prior_state) {
            Ok(decoded) => decoded,
            Err(diagnostics) => return DeleteResourceResponse { diagnostics },
        };

        tracing::debug!("Revoking setup key {}", id);
        let diagnostics = match client
            .setup_keys()
            .update(&id, &prior.to_revoke_request())
            .await
        {
            Ok(_) => vec![],
            Err(e) => vec![api_error_diagnostic("delete setup key", &e)],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for SetupKeyResource {
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

fn decode_with_id(state: &DynamicValue) -> Result<(String, SetupKeyModel), Vec<Diagnostic>> {
    let model = SetupKeyModel::from_value(state)?;
    match model.id.as_known() {
        Some(id) => Ok((id.clone(), model)),
        None => Err(vec![Diagnostic::error(
            "Missing setup key id",
            "State has no setup key id",
        )]),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use tfplug::schema::{PlanModifierRequest, ValidatorRequest};
    use tfplug::types::{AttributePath, Dynamic};

    #[tokio::test]
    async fn type_must_be_reusable_or_one_off() {
        let schema = SetupKeyResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema;
        let attr = schema.attribute("type").unwrap();

        let response = attr.validators[0].validate(ValidatorRequest {
            config_value: Dynamic::String("forever".to_string()),
            path: AttributePath::new("type"),
        });
        assert_eq!(response.diagnostics.len(), 1);
    }

    #[tokio::test]
    async fn changing_name_or_type_replaces_the_key() {
        let schema = SetupKeyResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema;

        for name in ["name", "type"] {
            let attr = schema.attribute(name).unwrap();
            let response = attr.plan_modifiers[0].modify(PlanModifierRequest {
                config_value: Dynamic::String("new".to_string()),
                state_value: Dynamic::String("old".to_string()),
                plan_value: Dynamic::String("new".to_string()),
                path: AttributePath::new(name),
            });
            assert!(response.requires_replace, "{} should force replacement", name);
        }
    }

    #[tokio::test]
    async fn key_is_sensitive_and_computed() {
        let schema = SetupKeyResource::new()
            .schema(Context::new(), ResourceSchemaRequest)
            .await
            .schema;
        assert!(schema
            .attribute("key")
            .is_some_and(|a| a.sensitive && a.computed && !a.optional));
        assert!(schema.attribute("expires_in").is_some_and(|a| !a.computed));
    }
}
