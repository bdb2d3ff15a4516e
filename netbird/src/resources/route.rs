//! Route resource implementation

use std::net::IpAddr;

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
use tfplug::schema::{
    AttributeBuilder, AttributeType, SchemaBuilder, Validator, ValidatorRequest,
    ValidatorResponse,
};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{Int64Between, StringLengthBetween};
use tfplug::value::{List, Model, Value};

use super::{api_error_diagnostic, not_configured};
use crate::api::Client;
use crate::models::RouteModel;
use crate::NetbirdProviderData;

#[derive(Default)]
pub struct RouteResource {
    provider_data: Option<NetbirdProviderData>,
}

impl RouteResource {
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
impl Resource for RouteResource {
    fn type_name(&self) -> &str {
        "netbird_route"
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
        let string_list = || AttributeType::list_of(AttributeType::String);
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a NetBird network route")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Route ID")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Route description")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .description("Route status")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("masquerade", AttributeType::Bool)
                    .description("Indicate if peer should masquerade traffic to this route's prefix")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("keep_route", AttributeType::Bool)
                    .description("Indicate if the route should be kept after a domain doesn't resolve that IP anymore")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("metric", AttributeType::Number)
                    .description("Route metric number. Lowest number has higher priority")
                    .required()
                    .validator(Int64Between::new(1, 9999))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("network", AttributeType::String)
                    .description("Network range in CIDR format, conflicts with domains")
                    .optional()
                    .computed()
                    .validator(IsCidr)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("domains", string_list())
                    .description("Domain list to be dynamically resolved, conflicts with network")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("network_id", AttributeType::String)
                    .description("Route network identifier, to group HA routes")
                    .required()
                    .validator(StringLengthBetween::new(1, 40))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("groups", string_list())
                    .description("Group IDs containing routing peers")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("peer", AttributeType::String)
                    .description("Peer identifier associated with route, conflicts with peer_groups")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("peer_groups", string_list())
                    .description("Peer group IDs associated with route, conflicts with peer")
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        // Type errors were already reported by the schema checks
        if let Ok(config) = RouteModel::from_value(&request.config) {
            check_exactly_one(
                ("network", string_is_set(&config.network)),
                ("domains", list_is_set(&config.domains)),
                &mut diagnostics,
            );
            check_exactly_one(
                ("peer", string_is_set(&config.peer)),
                ("peer_groups", list_is_set(&config.peer_groups)),
                &mut diagnostics,
            );
        }

        ValidateResourceConfigResponse { diagnostics }
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

        let plan = match RouteModel::from_value(&request.planned_state) {
            Ok(plan) => plan,
            Err(diagnostics) => {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics,
                }
            }
        };

        match client.routes().create(&plan.to_request()).await {
            Ok(route) => {
                tracing::debug!("Created route {} for network {}", route.id, route.network_id);
                CreateResourceResponse {
                    new_state: RouteModel::from_api(&route).to_value(),
                    diagnostics: vec![],
                }
            }
            Err(e) => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![api_error_diagnostic("create route", &e)],
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

        let id = match route_id(&request.current_state) {
            Ok(id) => id,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                }
            }
        };

        match client.routes().get(&id).await {
            Ok(route) => ReadResourceResponse {
                new_state: Some(RouteModel::from_api(&route).to_value()),
                diagnostics: vec![],
            },
            Err(e) => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![api_error_diagnostic("get route", &e)],
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

        let (id, plan) = match route_id(&request.prior_state)
            .and_then(|id| RouteModel::from_value(&request.planned_state).map(|p| (id, p)))
        {
            Ok(decoded) => decoded,
            Err(diagnostics) => {
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    diagnostics,
                }
            }
        };

        match client.routes().update(&id, &plan.to_request()).await {
            Ok(route) => UpdateResourceResponse {
                new_state: RouteModel::from_api(&route).to_value(),
                diagnostics: vec![],
            },
            Err(e) => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![api_error_diagnostic("update route", &e)],
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

        let id = match route_id(&request.prior_state) {
            Ok(id) => id,
            Err(diagnostics) => return DeleteResourceResponse { diagnostics },
        };

        let diagnostics = match client.routes().delete(&id).await {
            Ok(()) => vec![],
            Err(e) => vec![api_error_diagnostic("delete route", &e)],
        };
        DeleteResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithConfigure for RouteResource {
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

fn route_id(state: &DynamicValue) -> Result<String, Vec<Diagnostic>> {
    let model = RouteModel::from_value(state)?;
    model
        .id
        .into_known()
        .ok_or_else(|| vec![Diagnostic::error("Missing route id", "State has no route id")])
}

/// None while the value is still unknown
fn string_is_set(value: &Value<String>) -> Option<bool> {
    match value {
        Value::Unknown => None,
        Value::Null => Some(false),
        Value::Known(s) => Some(!s.is_empty()),
    }
}

fn list_is_set(value: &List<String>) -> Option<bool> {
    match value {
        Value::Unknown => None,
        Value::Null => Some(false),
        Value::Known(elements) => Some(!elements.is_empty()),
    }
}

/// Exactly one attribute of the pair may be set; skipped while either is unknown
fn check_exactly_one(
    (first, first_set): (&str, Option<bool>),
    (second, second_set): (&str, Option<bool>),
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (first_set, second_set) {
        (Some(true), Some(true)) => diagnostics.push(
            Diagnostic::error(
                "Invalid Attribute Combination",
                format!("Attribute {} cannot be specified when {} is specified", second, first),
            )
            .with_attribute(AttributePath::new(second)),
        ),
        (Some(false), Some(false)) => diagnostics.push(Diagnostic::error(
            "Invalid Attribute Combination",
            format!("Exactly one of these attributes must be configured: [{},{}]", first, second),
        )),
        _ => {}
    }
}

/// Network must be an IPv4 or IPv6 prefix such as `10.0.0.0/24`
pub struct IsCidr;

impl Validator for IsCidr {
    fn description(&self) -> String {
        "value must be a network range in CIDR notation".to_string()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];

        if let Some(s) = request.config_value.as_string() {
            if !is_cidr(s) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value",
                        format!("Attribute {} {}, got: {}", request.path, self.description(), s),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}
