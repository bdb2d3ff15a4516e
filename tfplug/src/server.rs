//! In-process provider host
//!
//! `ProviderServer` drives a provider through the same sequence of calls the
//! Terraform runtime makes: configure once, then validate, plan, apply and
//! read individual resources and data sources. Each call builds a fresh
//! resource or data source from its factory and configures it with the
//! provider data returned by `Provider::configure`.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ReadDataSourceResponse, ValidateDataSourceConfigRequest,
};
use crate::error::TfplugError;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderSchemaRequest, ResourceFactory,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest, ReadResourceRequest,
    ReadResourceResponse, ResourceSchemaRequest, ResourceWithConfigure, UpdateResourceRequest,
    ValidateResourceConfigRequest,
};
use crate::schema::{AttributeType, PlanModifierRequest, Schema, ValidatorRequest};
use crate::types::{AttributePath, Diagnostic, Diagnostics, Dynamic, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of planning a resource change
pub struct PlanResourceChangeResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of applying a planned change
pub struct ApplyResourceChangeResponse {
    pub new_state: DynamicValue,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ProviderServer<P: Provider> {
    provider: P,
    provider_data: Option<Arc<dyn Any + Send + Sync>>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let resources = provider.resources();
        let data_sources = provider.data_sources();
        Self {
            provider,
            provider_data: None,
            resources,
            data_sources,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn is_configured(&self) -> bool {
        self.provider_data.is_some()
    }

    pub fn resource_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn data_source_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data_sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate the provider block and configure the provider
    pub async fn configure(&mut self, config: DynamicValue) -> Vec<Diagnostic> {
        let schema = self
            .provider
            .schema(Context::new(), ProviderSchemaRequest)
            .await;
        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(validate_config(&schema.schema, &config));
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let response = self
            .provider
            .configure(Context::new(), ConfigureProviderRequest { config })
            .await;
        diagnostics.extend(response.diagnostics);

        if !diagnostics.has_errors() {
            tracing::debug!("Provider {} configured", self.provider.type_name());
            self.provider_data = response.provider_data;
        }

        diagnostics
    }

    pub async fn resource_schema(&self, type_name: &str) -> Result<Schema, Vec<Diagnostic>> {
        let resource = self.resource(type_name).await?;
        let response = resource.schema(Context::new(), ResourceSchemaRequest).await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(response.schema)
    }

    pub async fn data_source_schema(&self, type_name: &str) -> Result<Schema, Vec<Diagnostic>> {
        let data_source = self.data_source(type_name).await?;
        let response = data_source
            .schema(Context::new(), DataSourceSchemaRequest)
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(response.schema)
    }

    /// Schema checks (required, computed-only, types, validators) followed
    /// by the resource's own validation
    pub async fn validate_resource_config(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let resource = match self.resource(type_name).await {
            Ok(r) => r,
            Err(diags) => return diags,
        };
        let schema = resource.schema(Context::new(), ResourceSchemaRequest).await;

        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(validate_config(&schema.schema, &config));
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    /// Compute the planned state for a resource
    ///
    /// A null config plans a destroy. Otherwise the plan starts from config,
    /// computed attributes left null by config keep their prior value, and
    /// when anything changes those attributes become unknown before plan
    /// modifiers run.
    pub async fn plan_resource_change(
        &self,
        type_name: &str,
        prior_state: DynamicValue,
        config: DynamicValue,
    ) -> PlanResourceChangeResponse {
        let mut response = PlanResourceChangeResponse {
            planned_state: DynamicValue::null(),
            requires_replace: vec![],
            diagnostics: vec![],
        };

        if config.is_null() {
            return response;
        }

        let schema = match self.resource_schema(type_name).await {
            Ok(s) => s,
            Err(diags) => {
                response.diagnostics = diags;
                return response;
            }
        };

        let mut planned = config.clone();
        for attr in &schema.block.attributes {
            let path = AttributePath::new(&attr.name);
            let mut value = config.get(&path).cloned().unwrap_or(Dynamic::Null);
            if attr.computed && value.is_null() {
                value = prior_state.get(&path).cloned().unwrap_or(Dynamic::Null);
            }
            if let Err(e) = planned.set(&path, value) {
                response.diagnostics.push(plan_error(&path, e));
            }
        }

        let changed = prior_state.is_null()
            || schema.block.attributes.iter().any(|attr| {
                let path = AttributePath::new(&attr.name);
                planned.get(&path).ok() != prior_state.get(&path).ok()
            });

        if changed {
            for attr in schema.block.attributes.iter().filter(|a| a.computed) {
                let path = AttributePath::new(&attr.name);
                if matches!(config.get(&path), Ok(Dynamic::Null)) {
                    if let Err(e) = planned.mark_unknown(&path) {
                        response.diagnostics.push(plan_error(&path, e));
                    }
                }
            }
        }

        for attr in &schema.block.attributes {
            if attr.plan_modifiers.is_empty() {
                continue;
            }
            let path = AttributePath::new(&attr.name);
            let config_value = config.get(&path).cloned().unwrap_or(Dynamic::Null);
            let state_value = prior_state.get(&path).cloned().unwrap_or(Dynamic::Null);
            let mut plan_value = planned.get(&path).cloned().unwrap_or(Dynamic::Null);

            for modifier in &attr.plan_modifiers {
                let modified = modifier.modify(PlanModifierRequest {
                    config_value: config_value.clone(),
                    state_value: state_value.clone(),
                    plan_value,
                    path: path.clone(),
                });
                plan_value = modified.plan_value;
                response.diagnostics.extend(modified.diagnostics);
                if modified.requires_replace && !response.requires_replace.contains(&path) {
                    response.requires_replace.push(path.clone());
                }
            }

            if let Err(e) = planned.set(&path, plan_value) {
                response.diagnostics.push(plan_error(&path, e));
            }
        }

        tracing::debug!(
            "Planned {} with {} attribute(s) requiring replacement",
            type_name,
            response.requires_replace.len()
        );
        response.planned_state = planned;
        response
    }

    /// Apply a planned change: create when there is no prior state, delete
    /// when the plan is null, update otherwise
    pub async fn apply_resource_change(
        &self,
        type_name: &str,
        prior_state: DynamicValue,
        planned_state: DynamicValue,
        config: DynamicValue,
    ) -> ApplyResourceChangeResponse {
        let resource = match self.resource(type_name).await {
            Ok(r) => r,
            Err(diagnostics) => {
                return ApplyResourceChangeResponse {
                    new_state: prior_state,
                    diagnostics,
                }
            }
        };

        let ctx = Context::new();
        match (prior_state.is_null(), planned_state.is_null()) {
            (true, true) => ApplyResourceChangeResponse {
                new_state: DynamicValue::null(),
                diagnostics: vec![],
            },
            (false, true) => {
                tracing::debug!("Deleting {}", type_name);
                let response = resource
                    .delete(
                        ctx,
                        DeleteResourceRequest {
                            type_name: type_name.to_string(),
                            prior_state: prior_state.clone(),
                        },
                    )
                    .await;
                let new_state = if response.diagnostics.has_errors() {
                    prior_state
                } else {
                    DynamicValue::null()
                };
                ApplyResourceChangeResponse {
                    new_state,
                    diagnostics: response.diagnostics,
                }
            }
            (true, false) => {
                tracing::debug!("Creating {}", type_name);
                let response = resource
                    .create(
                        ctx,
                        CreateResourceRequest {
                            type_name: type_name.to_string(),
                            planned_state,
                            config,
                        },
                    )
                    .await;
                if response.diagnostics.has_errors() {
                    return ApplyResourceChangeResponse {
                        new_state: DynamicValue::null(),
                        diagnostics: response.diagnostics,
                    };
                }
                check_applied(type_name, response.new_state, response.diagnostics)
            }
            (false, false) => {
                tracing::debug!("Updating {}", type_name);
                let response = resource
                    .update(
                        ctx,
                        UpdateResourceRequest {
                            type_name: type_name.to_string(),
                            prior_state: prior_state.clone(),
                            planned_state,
                            config,
                        },
                    )
                    .await;
                if response.diagnostics.has_errors() {
                    return ApplyResourceChangeResponse {
                        new_state: prior_state,
                        diagnostics: response.diagnostics,
                    };
                }
                check_applied(type_name, response.new_state, response.diagnostics)
            }
        }
    }

    /// Refresh a resource; `new_state` is None when it no longer exists
    pub async fn read_resource(
        &self,
        type_name: &str,
        current_state: DynamicValue,
    ) -> ReadResourceResponse {
        let resource = match self.resource(type_name).await {
            Ok(r) => r,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(current_state),
                    diagnostics,
                }
            }
        };

        resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: type_name.to_string(),
                    current_state,
                },
            )
            .await
    }

    pub async fn validate_data_source_config(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let data_source = match self.data_source(type_name).await {
            Ok(d) => d,
            Err(diags) => return diags,
        };
        let schema = data_source
            .schema(Context::new(), DataSourceSchemaRequest)
            .await;

        let mut diagnostics = schema.diagnostics;
        diagnostics.extend(validate_config(&schema.schema, &config));
        if diagnostics.has_errors() {
            return diagnostics;
        }

        let response = data_source
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: DynamicValue,
    ) -> ReadDataSourceResponse {
        let data_source = match self.data_source(type_name).await {
            Ok(d) => d,
            Err(diagnostics) => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                }
            }
        };

        data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: type_name.to_string(),
                    config,
                },
            )
            .await
    }

    async fn resource(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self.resources.get(type_name).ok_or_else(|| {
            vec![Diagnostic::error(
                "Unknown resource type",
                TfplugError::ResourceNotFound(type_name.to_string()).to_string(),
            )]
        })?;

        let mut resource = factory();
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: self.provider_data.clone(),
                },
            )
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn data_source(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let factory = self.data_sources.get(type_name).ok_or_else(|| {
            vec![Diagnostic::error(
                "Unknown data source type",
                TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
            )]
        })?;

        let mut data_source = factory();
        let response = data_source
            .configure(
                Context::new(),
                ConfigureDataSourceRequest {
                    provider_data: self.provider_data.clone(),
                },
            )
            .await;
        if response.diagnostics.has_errors() {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }
}

fn plan_error(path: &AttributePath, err: TfplugError) -> Diagnostic {
    Diagnostic::error("Planning failed", err.to_string()).with_attribute(path.clone())
}

fn check_applied(
    type_name: &str,
    new_state: DynamicValue,
    mut diagnostics: Vec<Diagnostic>,
) -> ApplyResourceChangeResponse {
    if new_state.value.contains_unknown() {
        diagnostics.push(Diagnostic::error(
            "Provider returned invalid result object after apply",
            format!(
                "After the apply operation, the provider still indicated an unknown value for {}. All values must be known after apply.",
                type_name
            ),
        ));
    }
    ApplyResourceChangeResponse {
        new_state,
        diagnostics,
    }
}

/// Check a configuration object against a schema
///
/// Unknown values pass every check; validators only see known, non-null values.
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];

    let fields = match &config.value {
        Dynamic::Null | Dynamic::Unknown => return diagnostics,
        Dynamic::Map(fields) => fields,
        other => {
            diagnostics.push(Diagnostic::error(
                "Invalid configuration",
                format!("expected an object, got {}", other.type_name()),
            ));
            return diagnostics;
        }
    };

    for name in fields.keys() {
        if schema.attribute(name).is_none() {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named {:?} is not expected here.", name),
                )
                .with_attribute(AttributePath::new(name)),
            );
        }
    }

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = fields.get(&attr.name).unwrap_or(&Dynamic::Null);

        if value.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument {:?} is required, but no definition was found.", attr.name),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }

        if attr.computed && !attr.optional && !attr.required {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid configuration",
                    format!("{:?} is computed and cannot be set in configuration", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if !type_matches(value, &attr.r#type) {
            diagnostics.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!(
                        "Attribute {} expects {:?}, got {}",
                        attr.name,
                        attr.r#type,
                        value.type_name()
                    ),
                )
                .with_attribute(path),
            );
            continue;
        }

        if value.is_unknown() {
            continue;
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config_value: value.clone(),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    diagnostics
}

fn type_matches(value: &Dynamic, expected: &AttributeType) -> bool {
    match (value, expected) {
        (Dynamic::Null | Dynamic::Unknown, _) => true,
        (Dynamic::String(_), AttributeType::String) => true,
        (Dynamic::Number(_), AttributeType::Number) => true,
        (Dynamic::Bool(_), AttributeType::Bool) => true,
        (Dynamic::List(items), AttributeType::List(element))
        | (Dynamic::List(items), AttributeType::Set(element)) => {
            items.iter().all(|item| type_matches(item, element))
        }
        (Dynamic::Map(entries), AttributeType::Map(element)) => {
            entries.values().all(|v| type_matches(v, element))
        }
        (Dynamic::Map(entries), AttributeType::Object(fields)) => {
            entries.iter().all(|(k, v)| {
                fields
                    .get(k)
                    .is_some_and(|field_type| type_matches(v, field_type))
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{
        ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
        DataSourceMetadataResponse, DataSourceSchemaResponse, ValidateDataSourceConfigResponse,
    };
    use crate::plan_modifier::{RequiresReplace, UseStateForUnknown};
    use crate::provider::{
        ConfigureProviderResponse, ProviderMetadataRequest, ProviderMetadataResponse,
        ProviderSchemaResponse,
    };
    use crate::resource::{
        ConfigureResourceResponse, CreateResourceResponse, DeleteResourceResponse, Resource,
        ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaResponse,
        UpdateResourceResponse, ValidateResourceConfigResponse,
    };
    use crate::schema::{AttributeBuilder, SchemaBuilder};
    use crate::validator::StringLengthBetween;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CallLog {
        calls: Mutex<Vec<String>>,
    }

    impl CallLog {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct TestProvider;

    #[async_trait]
    impl Provider for TestProvider {
        fn type_name(&self) -> &str {
            "test"
        }

        async fn metadata(
            &self,
            _ctx: Context,
            _request: ProviderMetadataRequest,
        ) -> ProviderMetadataResponse {
            ProviderMetadataResponse {
                type_name: "test".to_string(),
            }
        }

        async fn schema(
            &self,
            _ctx: Context,
            _request: ProviderSchemaRequest,
        ) -> ProviderSchemaResponse {
            ProviderSchemaResponse {
                schema: SchemaBuilder::new()
                    .attribute(
                        AttributeBuilder::new("endpoint", AttributeType::String)
                            .optional()
                            .build(),
                    )
                    .build(),
                diagnostics: vec![],
            }
        }

        async fn configure(
            &mut self,
            _ctx: Context,
            request: ConfigureProviderRequest,
        ) -> ConfigureProviderResponse {
            if request
                .config
                .get_string(&AttributePath::new("endpoint"))
                .is_ok_and(|e| e == "broken")
            {
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error("Bad endpoint", "")],
                    provider_data: None,
                };
            }
            ConfigureProviderResponse {
                diagnostics: vec![],
                provider_data: Some(Arc::new(Arc::new(CallLog::default()))),
            }
        }

        fn resources(&self) -> HashMap<String, ResourceFactory> {
            let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
            resources.insert("test_thing".to_string(), || -> Box<dyn ResourceWithConfigure> {
                Box::new(ThingResource::default())
            });
            resources
        }

        fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
            let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
            data_sources.insert("test_echo".to_string(), || -> Box<dyn DataSourceWithConfigure> {
                Box::new(EchoDataSource)
            });
            data_sources
        }
    }

    #[derive(Default)]
    struct ThingResource {
        log: Option<Arc<CallLog>>,
    }

    fn thing_schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringLengthBetween::new(1, 10))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("kind", AttributeType::String)
                    .optional()
                    .plan_modifier(RequiresReplace)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tags", AttributeType::list_of(AttributeType::String))
                    .optional()
                    .computed()
                    .build(),
            )
            .build()
    }

    fn resolve_unknowns(mut state: DynamicValue) -> DynamicValue {
        if state.get(&AttributePath::new("id")).is_ok_and(Dynamic::is_unknown) {
            state
                .set_string(&AttributePath::new("id"), "thing-1".to_string())
                .unwrap();
        }
        if state.get(&AttributePath::new("tags")).is_ok_and(Dynamic::is_unknown) {
            state.set_list(&AttributePath::new("tags"), vec![]).unwrap();
        }
        state
    }

    #[async_trait]
    impl Resource for ThingResource {
        fn type_name(&self) -> &str {
            "test_thing"
        }

        async fn metadata(
            &self,
            _ctx: Context,
            _request: ResourceMetadataRequest,
        ) -> ResourceMetadataResponse {
            ResourceMetadataResponse {
                type_name: "test_thing".to_string(),
            }
        }

        async fn schema(
            &self,
            _ctx: Context,
            _request: ResourceSchemaRequest,
        ) -> ResourceSchemaResponse {
            ResourceSchemaResponse {
                schema: thing_schema(),
                diagnostics: vec![],
            }
        }

        async fn validate(
            &self,
            _ctx: Context,
            request: ValidateResourceConfigRequest,
        ) -> ValidateResourceConfigResponse {
            let mut diagnostics = vec![];
            if request
                .config
                .get_string(&AttributePath::new("name"))
                .is_ok_and(|n| n == "forbidden")
            {
                diagnostics.push(Diagnostic::error("Forbidden name", ""));
            }
            ValidateResourceConfigResponse { diagnostics }
        }

        async fn create(
            &self,
            _ctx: Context,
            request: CreateResourceRequest,
        ) -> CreateResourceResponse {
            let Some(log) = &self.log else {
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    diagnostics: vec![Diagnostic::error("Provider not configured", "")],
                };
            };
            log.record("create");
            let lazy = request
                .planned_state
                .get_string(&AttributePath::new("name"))
                .is_ok_and(|n| n == "lazy");
            let new_state = if lazy {
                request.planned_state
            } else {
                resolve_unknowns(request.planned_state)
            };
            CreateResourceResponse {
                new_state,
                diagnostics: vec![],
            }
        }

        async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
            if let Some(log) = &self.log {
                log.record("read");
            }
            ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![],
            }
        }

        async fn update(
            &self,
            _ctx: Context,
            request: UpdateResourceRequest,
        ) -> UpdateResourceResponse {
            if let Some(log) = &self.log {
                log.record("update");
            }
            UpdateResourceResponse {
                new_state: resolve_unknowns(request.planned_state),
                diagnostics: vec![],
            }
        }

        async fn delete(
            &self,
            _ctx: Context,
            _request: DeleteResourceRequest,
        ) -> DeleteResourceResponse {
            if let Some(log) = &self.log {
                log.record("delete");
            }
            DeleteResourceResponse {
                diagnostics: vec![],
            }
        }
    }

    #[async_trait]
    impl ResourceWithConfigure for ThingResource {
        async fn configure(
            &mut self,
            _ctx: Context,
            request: ConfigureResourceRequest,
        ) -> ConfigureResourceResponse {
            if let Some(data) = request.provider_data {
                self.log = data.downcast_ref::<Arc<CallLog>>().cloned();
            }
            ConfigureResourceResponse {
                diagnostics: vec![],
            }
        }
    }

    struct EchoDataSource;

    #[async_trait]
    impl DataSource for EchoDataSource {
        fn type_name(&self) -> &str {
            "test_echo"
        }

        async fn metadata(
            &self,
            _ctx: Context,
            _request: DataSourceMetadataRequest,
        ) -> DataSourceMetadataResponse {
            DataSourceMetadataResponse {
                type_name: "test_echo".to_string(),
            }
        }

        async fn schema(
            &self,
            _ctx: Context,
            _request: DataSourceSchemaRequest,
        ) -> DataSourceSchemaResponse {
            DataSourceSchemaResponse {
                schema: SchemaBuilder::new()
                    .attribute(
                        AttributeBuilder::new("input", AttributeType::String)
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("output", AttributeType::String)
                            .computed()
                            .build(),
                    )
                    .build(),
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

        async fn read(
            &self,
            _ctx: Context,
            request: ReadDataSourceRequest,
        ) -> ReadDataSourceResponse {
            let mut state = request.config.clone();
            let input = request
                .config
                .get_string(&AttributePath::new("input"))
                .unwrap_or_default();
            state
                .set_string(&AttributePath::new("output"), input.to_uppercase())
                .unwrap();
            ReadDataSourceResponse {
                state,
                diagnostics: vec![],
            }
        }
    }

    #[async_trait]
    impl DataSourceWithConfigure for EchoDataSource {
        async fn configure(
            &mut self,
            _ctx: Context,
            _request: ConfigureDataSourceRequest,
        ) -> ConfigureDataSourceResponse {
            ConfigureDataSourceResponse {
                diagnostics: vec![],
            }
        }
    }

    async fn configured_server() -> ProviderServer<TestProvider> {
        let mut server = ProviderServer::new(TestProvider);
        let diags = server.configure(DynamicValue::object()).await;
        assert!(diags.is_empty(), "{:?}", diags);
        server
    }

    fn log_of(server: &ProviderServer<TestProvider>) -> Arc<CallLog> {
        server
            .provider_data
            .as_ref()
            .and_then(|d| d.downcast_ref::<Arc<CallLog>>())
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn configure_failure_keeps_server_unconfigured() {
        let mut server = ProviderServer::new(TestProvider);
        let diags = server
            .configure(DynamicValue::from_json(json!({"endpoint": "broken"})))
            .await;
        assert!(diags.has_errors());
        assert!(!server.is_configured());

        let diags = server
            .configure(DynamicValue::from_json(json!({"endpont": "typo"})))
            .await;
        assert_eq!(diags[0].summary, "Unsupported argument");
    }

    #[tokio::test]
    async fn lists_registered_types() {
        let server = ProviderServer::new(TestProvider);
        assert_eq!(server.resource_types(), vec!["test_thing".to_string()]);
        assert_eq!(server.data_source_types(), vec!["test_echo".to_string()]);
    }

    #[tokio::test]
    async fn validate_runs_schema_checks_then_resource_validate() {
        let server = configured_server().await;

        let diags = server
            .validate_resource_config("test_thing", DynamicValue::from_json(json!({})))
            .await;
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Missing required argument");

        let diags = server
            .validate_resource_config(
                "test_thing",
                DynamicValue::from_json(json!({"name": "far-too-long-name"})),
            )
            .await;
        assert_eq!(diags[0].summary, "Invalid Attribute Value Length");

        let diags = server
            .validate_resource_config(
                "test_thing",
                DynamicValue::from_json(json!({"name": "ok", "id": "set-by-user"})),
            )
            .await;
        assert!(diags.has_errors());

        let diags = server
            .validate_resource_config(
                "test_thing",
                DynamicValue::from_json(json!({"name": "ok", "tags": [1]})),
            )
            .await;
        assert_eq!(diags[0].summary, "Incorrect attribute value type");

        let diags = server
            .validate_resource_config(
                "test_thing",
                DynamicValue::from_json(json!({"name": "forbidden"})),
            )
            .await;
        assert_eq!(diags[0].summary, "Forbidden name");

        let mut unknown_name = DynamicValue::object();
        unknown_name.mark_unknown(&AttributePath::new("name")).unwrap();
        let diags = server
            .validate_resource_config("test_thing", unknown_name)
            .await;
        assert!(diags.is_empty());
    }

    #[tokio::test]
    async fn unknown_resource_type_is_reported() {
        let server = configured_server().await;
        let diags = server
            .validate_resource_config("test_missing", DynamicValue::object())
            .await;
        assert_eq!(diags[0].summary, "Unknown resource type");
        assert!(diags[0].detail.contains("test_missing"));
    }

    #[tokio::test]
    async fn create_plan_marks_computed_unknown_and_apply_resolves_it() {
        let server = configured_server().await;
        let config = DynamicValue::from_json(json!({"name": "web"}));

        let plan = server
            .plan_resource_change("test_thing", DynamicValue::null(), config.clone())
            .await;
        assert!(plan.diagnostics.is_empty());
        assert!(plan.requires_replace.is_empty());
        assert!(plan
            .planned_state
            .get(&AttributePath::new("id"))
            .unwrap()
            .is_unknown());
        assert!(plan
            .planned_state
            .get(&AttributePath::new("tags"))
            .unwrap()
            .is_unknown());
        assert!(plan
            .planned_state
            .get(&AttributePath::new("kind"))
            .unwrap()
            .is_null());

        let applied = server
            .apply_resource_change("test_thing", DynamicValue::null(), plan.planned_state, config)
            .await;
        assert!(applied.diagnostics.is_empty());
        assert_eq!(
            applied.new_state.get_string(&AttributePath::new("id")).unwrap(),
            "thing-1"
        );
        assert_eq!(log_of(&server).calls(), vec!["create"]);
    }

    #[tokio::test]
    async fn unchanged_plan_keeps_prior_computed_values() {
        let server = configured_server().await;
        let prior = DynamicValue::from_json(
            json!({"id": "thing-1", "name": "web", "kind": null, "tags": ["a"]}),
        );
        let config = DynamicValue::from_json(json!({"name": "web"}));

        let plan = server
            .plan_resource_change("test_thing", prior.clone(), config)
            .await;
        assert_eq!(plan.planned_state, prior);
    }

    #[tokio::test]
    async fn update_plan_keeps_id_and_flags_replacement() {
        let server = configured_server().await;
        let prior = DynamicValue::from_json(
            json!({"id": "thing-1", "name": "web", "kind": "a", "tags": ["a"]}),
        );
        let config = DynamicValue::from_json(json!({"name": "web", "kind": "b"}));

        let plan = server
            .plan_resource_change("test_thing", prior, config)
            .await;
        assert_eq!(
            plan.planned_state.get_string(&AttributePath::new("id")).unwrap(),
            "thing-1"
        );
        assert!(plan
            .planned_state
            .get(&AttributePath::new("tags"))
            .unwrap()
            .is_unknown());
        assert_eq!(plan.requires_replace, vec![AttributePath::new("kind")]);
    }

    #[tokio::test]
    async fn null_config_plans_destroy_and_apply_deletes() {
        let server = configured_server().await;
        let prior = DynamicValue::from_json(json!({"id": "thing-1", "name": "web"}));

        let plan = server
            .plan_resource_change("test_thing", prior.clone(), DynamicValue::null())
            .await;
        assert!(plan.planned_state.is_null());

        let applied = server
            .apply_resource_change(
                "test_thing",
                prior,
                plan.planned_state,
                DynamicValue::null(),
            )
            .await;
        assert!(applied.diagnostics.is_empty());
        assert!(applied.new_state.is_null());
        assert_eq!(log_of(&server).calls(), vec!["delete"]);
    }

    #[tokio::test]
    async fn apply_update_dispatches_to_update() {
        let server = configured_server().await;
        let prior = DynamicValue::from_json(json!({"id": "thing-1", "name": "web", "tags": []}));
        let planned = DynamicValue::from_json(json!({"id": "thing-1", "name": "api", "tags": []}));

        let applied = server
            .apply_resource_change("test_thing", prior, planned.clone(), planned)
            .await;
        assert!(applied.diagnostics.is_empty());
        assert_eq!(
            applied.new_state.get_string(&AttributePath::new("name")).unwrap(),
            "api"
        );
        assert_eq!(log_of(&server).calls(), vec!["update"]);
    }

    #[tokio::test]
    async fn apply_rejects_unknown_values_in_result() {
        let server = configured_server().await;
        let config = DynamicValue::from_json(json!({"name": "lazy"}));
        let plan = server
            .plan_resource_change("test_thing", DynamicValue::null(), config.clone())
            .await;

        let applied = server
            .apply_resource_change("test_thing", DynamicValue::null(), plan.planned_state, config)
            .await;
        assert!(applied.diagnostics.has_errors());
        assert_eq!(
            applied.diagnostics[0].summary,
            "Provider returned invalid result object after apply"
        );
    }

    #[tokio::test]
    async fn unconfigured_server_reaches_resources_without_provider_data() {
        let server = ProviderServer::new(TestProvider);
        let config = DynamicValue::from_json(json!({"name": "web"}));
        let plan = server
            .plan_resource_change("test_thing", DynamicValue::null(), config.clone())
            .await;

        let applied = server
            .apply_resource_change("test_thing", DynamicValue::null(), plan.planned_state, config)
            .await;
        assert_eq!(applied.diagnostics[0].summary, "Provider not configured");
        assert!(applied.new_state.is_null());
    }

    #[tokio::test]
    async fn read_resource_returns_resource_state() {
        let server = configured_server().await;
        let state = DynamicValue::from_json(json!({"id": "thing-1", "name": "web"}));

        let response = server.read_resource("test_thing", state.clone()).await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(response.new_state, Some(state));
        assert_eq!(log_of(&server).calls(), vec!["read"]);
    }

    #[tokio::test]
    async fn data_source_validate_and_read() {
        let server = configured_server().await;

        let diags = server
            .validate_data_source_config(
                "test_echo",
                DynamicValue::from_json(json!({"output": "x", "input": "a"})),
            )
            .await;
        assert!(diags.has_errors());

        let response = server
            .read_data_source("test_echo", DynamicValue::from_json(json!({"input": "hi"})))
            .await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response.state.get_string(&AttributePath::new("output")).unwrap(),
            "HI"
        );

        let response = server
            .read_data_source("test_nope", DynamicValue::object())
            .await;
        assert_eq!(response.diagnostics[0].summary, "Unknown data source type");
    }
}
