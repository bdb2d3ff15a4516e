//! Mapping between Terraform models and REST DTOs
//!
//! Unknown and null attribute values both count as "unset". Where the REST
//! field is mandatory an unset value becomes the zero value; where it is
//! optional the field is left out of the request.

pub mod group;
pub mod route;
pub mod setup_key;

pub use group::GroupModel;
pub use route::RouteModel;
pub use setup_key::SetupKeyModel;

use tfplug::value::{List, Value};

/// Known elements of a list attribute
///
/// Unknown or null elements cannot be sent to the API and are dropped with a
/// warning. An unset list yields no elements.
pub fn list_elements(attribute: &str, list: &List<String>) -> Vec<String> {
    let Some(elements) = list.as_known() else {
        return Vec::new();
    };

    elements
        .iter()
        .enumerate()
        .filter_map(|(index, element)| match element {
            Value::Known(v) => Some(v.clone()),
            Value::Unknown | Value::Null => {
                tracing::warn!(
                    "Skipping unset element {} of {}: only known values can be sent",
                    index,
                    attribute
                );
                None
            }
        })
        .collect()
}

/// Elements of an optional list attribute, or None when it is unset or empty
pub fn optional_list(attribute: &str, list: &List<String>) -> Option<Vec<String>> {
    let elements = list_elements(attribute, list);
    if elements.is_empty() {
        None
    } else {
        Some(elements)
    }
}

/// A known, non-empty string
pub fn optional_string(value: &Value<String>) -> Option<String> {
    value.as_known().filter(|s| !s.is_empty()).cloned()
}

/// A known list built from a possibly absent API list; absent becomes empty
pub fn string_list(values: Option<&[String]>) -> List<String> {
    List::from_elements(values.unwrap_or_default().iter().cloned())
}
