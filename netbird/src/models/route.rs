use std::collections::HashMap;

use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::value::{List, Model, ObjectReader, Value};

use super::{list_elements, optional_list, optional_string, string_list};
use crate::api::routes::{Route, RouteRequest};

/// Terraform model of `netbird_route`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteModel {
    pub id: Value<String>,
    pub description: Value<String>,
    pub enabled: Value<bool>,
    pub masquerade: Value<bool>,
    pub keep_route: Value<bool>,
    pub metric: Value<i64>,
    pub network: Value<String>,
    pub domains: List<String>,
    pub network_id: Value<String>,
    pub groups: List<String>,
    pub peer: Value<String>,
    pub peer_groups: List<String>,
}

impl Model for RouteModel {
    fn from_value(value: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut reader = ObjectReader::new(value);
        let model = Self {
            id: reader.get("id"),
            description: reader.get("description"),
            enabled: reader.get("enabled"),
            masquerade: reader.get("masquerade"),
            keep_route: reader.get("keep_route"),
            metric: reader.get("metric"),
            network: reader.get("network"),
            domains: reader.get("domains"),
            network_id: reader.get("network_id"),
            groups: reader.get("groups"),
            peer: reader.get("peer"),
            peer_groups: reader.get("peer_groups"),
        };
        reader.finish().map(|_| model)
    }

    fn to_value(&self) -> DynamicValue {
        let fields = HashMap::from([
            ("id".to_string(), self.id.to_dynamic()),
            ("description".to_string(), self.description.to_dynamic()),
            ("enabled".to_string(), self.enabled.to_dynamic()),
            ("masquerade".to_string(), self.masquerade.to_dynamic()),
            ("keep_route".to_string(), self.keep_route.to_dynamic()),
            ("metric".to_string(), self.metric.to_dynamic()),
            ("network".to_string(), self.network.to_dynamic()),
            ("domains".to_string(), self.domains.to_dynamic()),
            ("network_id".to_string(), self.network_id.to_dynamic()),
            ("groups".to_string(), self.groups.to_dynamic()),
            ("peer".to_string(), self.peer.to_dynamic()),
            ("peer_groups".to_string(), self.peer_groups.to_dynamic()),
        ]);
        DynamicValue::new(Dynamic::Map(fields))
    }
}

impl RouteModel {
    pub fn to_request(&self) -> RouteRequest {
        RouteRequest {
            description: self.description.value_or_default(),
            network_id: self.network_id.value_or_default(),
            enabled: self.enabled.value_or_default(),
            peer: optional_string(&self.peer),
            peer_groups: optional_list("peer_groups", &self.peer_groups),
            network: optional_string(&self.network),
            domains: optional_list("domains", &self.domains),
            metric: self.metric.value_or_default(),
            masquerade: self.masquerade.value_or_default(),
            groups: list_elements("groups", &self.groups),
            keep_route: self.keep_route.value_or_default(),
        }
    }

    pub fn from_api(route: &Route) -> Self {
        Self {
            id: Value::Known(route.id.clone()),
            description: Value::Known(route.description.clone()),
            enabled: Value::Known(route.enabled),
            masquerade: Value::Known(route.masquerade),
            keep_route: Value::Known(route.keep_route),
            metric: Value::Known(route.metric),
            network: route.network.clone().filter(|n| !n.is_empty()).into(),
            domains: string_list(route.domains.as_deref()),
            network_id: Value::Known(route.network_id.clone()),
            groups: string_list(Some(route.groups.as_slice())),
            peer: route.peer.clone().filter(|p| !p.is_empty()).into(),
            peer_groups: string_list(route.peer_groups.as_deref()),
        }
    }
}
