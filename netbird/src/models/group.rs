use std::collections::HashMap;

use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::value::{List, Model, ObjectReader, Value};

use super::{list_elements, string_list};
use crate::api::groups::{Group, GroupRequest};

/// Terraform model of `netbird_group`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupModel {
    pub id: Value<String>,
    pub name: Value<String>,
    pub peers: List<String>,
}

impl Model for GroupModel {
    fn from_value(value: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut reader = ObjectReader::new(value);
        let model = Self {
            id: reader.get("id"),
            name: reader.get("name"),
            peers: reader.get("peers"),
        };
        reader.finish().map(|_| model)
    }

    fn to_value(&self) -> DynamicValue {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), self.id.to_dynamic());
        fields.insert("name".to_string(), self.name.to_dynamic());
        fields.insert("peers".to_string(), self.peers.to_dynamic());
        DynamicValue::new(Dynamic::Map(fields))
    }
}

impl GroupModel {
    /// Peers are only sent when the attribute is known
    pub fn to_request(&self) -> GroupRequest {
        GroupRequest {
            name: self.name.value_or_default(),
            peers: self
                .peers
                .is_known()
                .then(|| list_elements("peers", &self.peers)),
        }
    }

    pub fn from_api(group: &Group) -> Self {
        let peer_ids = group.peer_ids();
        Self {
            id: Value::Known(group.id.clone()),
            name: Value::Known(group.name.clone()),
            peers: string_list(Some(peer_ids.as_slice())),
        }
    }
}

/// One entry of the `netbird_groups` data source
pub fn group_summary(group: &Group) -> Dynamic {
    let peers = group
        .peer_ids()
        .into_iter()
        .map(|id| {
            Dynamic::Map(HashMap::from([(
                "id".to_string(),
                Dynamic::String(id),
            )]))
        })
        .collect();

    Dynamic::Map(HashMap::from([
        ("id".to_string(), Dynamic::String(group.id.clone())),
        ("name".to_string(), Dynamic::String(group.name.clone())),
        ("peers".to_string(), Dynamic::List(peers)),
    ]))
}
