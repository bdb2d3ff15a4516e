use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use tfplug::types::{Diagnostic, Dynamic, DynamicValue};
use tfplug::value::{List, Model, ObjectReader, Value};

use super::{list_elements, string_list};
use crate::api::setup_keys::{CreateSetupKeyRequest, SetupKey, SetupKeyRequest};

/// Terraform model of `netbird_setup_key`
///
/// `expires_in` and `rotation_id` are write-only: the API never returns
/// them, so state keeps whatever the practitioner last configured.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetupKeyModel {
    pub id: Value<String>,
    pub name: Value<String>,
    pub key_type: Value<String>,
    pub expires_in: Value<i64>,
    pub rotation_id: Value<String>,
    pub usage_limit: Value<i64>,
    pub ephemeral: Value<bool>,
    pub auto_groups: List<String>,
    pub revoked: Value<bool>,
    pub key: Value<String>,
    pub state: Value<String>,
    pub valid: Value<bool>,
    pub used_times: Value<i64>,
    pub last_used: Value<String>,
    pub expires: Value<String>,
    pub updated_at: Value<String>,
}

impl Model for SetupKeyModel {
    fn from_value(value: &DynamicValue) -> Result<Self, Vec<Diagnostic>> {
        let mut reader = ObjectReader::new(value);
        let model = Self {
            id: reader.get("id"),
            name: reader.get("name"),
            key_type: reader.get("type"),
            expires_in: reader.get("expires_in"),
            rotation_id: reader.get("rotation_id"),
            usage_limit: reader.get("usage_limit"),
            ephemeral: reader.get("ephemeral"),
            auto_groups: reader.get("auto_groups"),
            revoked: reader.get("revoked"),
            key: reader.get("key"),
            state: reader.get("state"),
            valid: reader.get("valid"),
            used_times: reader.get("used_times"),
            last_used: reader.get("last_used"),
            expires: reader.get("expires"),
            updated_at: reader.get("updated_at"),
        };
        reader.finish().map(|_| model)
    }

    fn to_value(&self) -> DynamicValue {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), self.id.to_dynamic());
        fields.insert("name".to_string(), self.name.to_dynamic());
        fields.insert("type".to_string(), self.key_type.to_dynamic());
        fields.insert("expires_in".to_string(), self.expires_in.to_dynamic());
        fields.insert("rotation_id".to_string(), self.rotation_id.to_dynamic());
        fields.insert("usage_limit".to_string(), self.usage_limit.to_dynamic());
        fields.insert("ephemeral".to_string(), self.ephemeral.to_dynamic());
        fields.insert("auto_groups".to_string(), self.auto_groups.to_dynamic());
        fields.insert("revoked".to_string(), self.revoked.to_dynamic());
        fields.insert("key".to_string(), self.key.to_dynamic());
        fields.insert("state".to_string(), self.state.to_dynamic());
        fields.insert("valid".to_string(), self.valid.to_dynamic());
        fields.insert("used_times".to_string(), self.used_times.to_dynamic());
        fields.insert("last_used".to_string(), self.last_used.to_dynamic());
        fields.insert("expires".to_string(), self.expires.to_dynamic());
        fields.insert("updated_at".to_string(), self.updated_at.to_dynamic());
        DynamicValue::new(Dynamic::Map(fields))
    }
}

impl SetupKeyModel {
    pub fn to_create_request(&self) -> CreateSetupKeyRequest {
        CreateSetupKeyRequest {
            name: self.name.value_or_default(),
            key_type: self.key_type.value_or_default(),
            expires_in: self.expires_in.value_or_default(),
            auto_groups: list_elements("auto_groups", &self.auto_groups),
            usage_limit: self.usage_limit.value_or_default(),
            ephemeral: self.ephemeral.as_known().copied(),
        }
    }

    pub fn to_update_request(&self) -> SetupKeyRequest {
        SetupKeyRequest {
            name: self.name.value_or_default(),
            key_type: self.key_type.value_or_default(),
            expires_in: self.expires_in.value_or_default(),
            auto_groups: list_elements("auto_groups", &self.auto_groups),
            usage_limit: self.usage_limit.value_or_default(),
            revoked: self.revoked.value_or_default(),
            ephemeral: self.ephemeral.as_known().copied(),
        }
    }

    /// Update request that revokes the key and detaches its groups
    pub fn to_revoke_request(&self) -> SetupKeyRequest {
        SetupKeyRequest {
            revoked: true,
            auto_groups: Vec::new(),
            ..self.to_update_request()
        }
    }

    /// State from an API response; write-only attributes are left null
    pub fn from_api(key: &SetupKey) -> Self {
        Self {
            id: Value::Known(key.id.clone()),
            name: Value::Known(key.name.clone()),
            key_type: Value::Known(key.key_type.clone()),
            expires_in: Value::Null,
            rotation_id: Value::Null,
            usage_limit: Value::Known(key.usage_limit),
            ephemeral: Value::Known(key.ephemeral),
            auto_groups: string_list(key.auto_groups.as_deref()),
            revoked: Value::Known(key.revoked),
            key: Value::Known(key.key.clone()),
            state: Value::Known(key.state.clone()),
            valid: Value::Known(key.valid),
            used_times: Value::Known(key.used_times),
            last_used: Value::Known(key.last_used.map(timestamp).unwrap_or_default()),
            expires: Value::Known(timestamp(key.expires)),
            updated_at: Value::Known(timestamp(key.updated_at)),
        }
    }

    /// Carry `expires_in` and `rotation_id` over from `source`
    pub fn with_write_only_from(mut self, source: &SetupKeyModel) -> Self {
        self.expires_in = source.expires_in.clone();
        self.rotation_id = source.rotation_id.clone();
        self
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tfplug::types::AttributePath;

    fn api_key() -> SetupKey {
        SetupKey {
            id: "sk-1".to_string(),
            key: "A616097E".to_string(),
            name: "ci".to_string(),
            expires: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            key_type: "reusable".to_string(),
            valid: true,
            revoked: false,
            used_times: 3,
            last_used: None,
            state: "valid".to_string(),
            auto_groups: None,
            updated_at: Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
            usage_limit: 0,
            ephemeral: false,
        }
    }

    #[test]
    fn create_request_uses_zero_values_for_unset_attributes() {
        let plan = DynamicValue::from_json(json!({
            "name": "ci",
            "type": "one-off",
            "expires_in": null,
            "auto_groups": ["grp-1"]
        }));
        let model = SetupKeyModel::from_value(&plan).unwrap();

        let request = model.to_create_request();
        assert_eq!(request.name, "ci");
        assert_eq!(request.key_type, "one-off");
        assert_eq!(request.expires_in, 0);
        assert_eq!(request.usage_limit, 0);
        assert_eq!(request.auto_groups, vec!["grp-1"]);
        assert_eq!(request.ephemeral, None);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["type"], "one-off");
        assert!(body.get("ephemeral").is_none());
    }

    #[test]
    fn revoke_request_clears_groups() {
        let model = SetupKeyModel {
            name: Value::Known("ci".to_string()),
            key_type: Value::Known("reusable".to_string()),
            auto_groups: List::from_elements(vec!["grp-1".to_string()]),
            revoked: Value::Known(false),
            ephemeral: Value::Known(true),
            ..Default::default()
        };

        let request = model.to_revoke_request();
        assert!(request.revoked);
        assert!(request.auto_groups.is_empty());
        assert_eq!(request.name, "ci");
        assert_eq!(request.ephemeral, Some(true));
    }

    #[test]
    fn from_api_normalises_lists_and_timestamps() {
        let model = SetupKeyModel::from_api(&api_key());

        assert_eq!(model.auto_groups, Value::Known(vec![]));
        assert!(model.expires_in.is_null());
        assert!(model.rotation_id.is_null());
        assert_eq!(model.last_used, Value::Known(String::new()));
        assert_eq!(model.expires, Value::Known("2026-01-01T00:00:00Z".to_string()));
        assert_eq!(model.used_times, Value::Known(3));
    }

    #[test]
    fn write_only_attributes_are_carried_forward() {
        let prior = SetupKeyModel {
            expires_in: Value::Known(86400),
            rotation_id: Value::Known("r1".to_string()),
            ..Default::default()
        };

        let model = SetupKeyModel::from_api(&api_key()).with_write_only_from(&prior);
        assert_eq!(model.expires_in, Value::Known(86400));
        assert_eq!(model.rotation_id, Value::Known("r1".to_string()));

        let state = model.to_value();
        assert_eq!(
            state.get_string(&AttributePath::new("rotation_id")).unwrap(),
            "r1"
        );
        assert_eq!(state.get_string(&AttributePath::new("type")).unwrap(), "reusable");
    }
}
