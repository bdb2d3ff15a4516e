//! Typed tri-state attribute values
//!
//! Terraform attributes are either not yet known (during planning), null, or
//! a concrete value. `Value<T>` keeps those three states apart so providers
//! never have to guess whether an empty string or `false` was configured.
//!
//! Models are decoded with [`ObjectReader`] and encoded back by turning each
//! field into a [`Dynamic`] with [`Value::to_dynamic`].

use crate::error::{Result, TfplugError};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// A Terraform attribute value: unknown, null or known
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    /// Not known until apply
    Unknown,
    /// Explicitly null or absent
    Null,
    /// A concrete value
    Known(T),
}

/// A list attribute whose elements are themselves tri-state
pub type List<T> = Value<Vec<Value<T>>>;

impl<T> Value<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known(_))
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_known(self) -> Option<T> {
        match self {
            Value::Known(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Unknown => Value::Unknown,
            Value::Null => Value::Null,
            Value::Known(v) => Value::Known(f(v)),
        }
    }
}

impl<T: Clone + Default> Value<T> {
    /// The known value, or the type's zero value when unknown or null
    pub fn value_or_default(&self) -> T {
        self.as_known().cloned().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::Known(v),
            None => Value::Null,
        }
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Null
    }
}

/// Conversion between a Rust type and a known Terraform value
pub trait AttributeValue: Sized {
    fn from_dynamic(value: &Dynamic) -> Result<Self>;
    fn to_dynamic(&self) -> Dynamic;
}

impl AttributeValue for String {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::String(self.clone())
    }
}

impl AttributeValue for bool {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Bool(*self)
    }
}

impl AttributeValue for i64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::Number(n) if n.fract() != 0.0 => Err(TfplugError::DecodingError(format!(
                "{} is not a whole number",
                n
            ))),
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            Dynamic::Number(n) if *n >= i64::MIN as f64 && *n < i64::MAX as f64 => Ok(*n as i64),
            Dynamic::Number(n) => Err(TfplugError::DecodingError(format!(
                "{} does not fit in a 64-bit integer",
                n
            ))),
            other => Err(mismatch("number", other)),
        }
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Number(*self as f64)
    }
}

impl<T: AttributeValue> AttributeValue for Value<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::Unknown => Ok(Value::Unknown),
            Dynamic::Null => Ok(Value::Null),
            other => T::from_dynamic(other).map(Value::Known),
        }
    }

    fn to_dynamic(&self) -> Dynamic {
        match self {
            Value::Unknown => Dynamic::Unknown,
            Value::Null => Dynamic::Null,
            Value::Known(v) => v.to_dynamic(),
        }
    }
}

impl<T: AttributeValue> AttributeValue for Vec<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value {
            Dynamic::List(items) => items.iter().map(T::from_dynamic).collect(),
            other => Err(mismatch("list", other)),
        }
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::List(self.iter().map(AttributeValue::to_dynamic).collect())
    }
}

impl<T: AttributeValue> Value<T> {
    pub fn to_dynamic(&self) -> Dynamic {
        <Self as AttributeValue>::to_dynamic(self)
    }
}

impl<T> Value<Vec<Value<T>>> {
    /// Build a known list from plain elements
    pub fn from_elements(elements: impl IntoIterator<Item = T>) -> Self {
        Value::Known(elements.into_iter().map(Value::Known).collect())
    }
}

fn mismatch(expected: &str, actual: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

impl DynamicValue {
    /// Typed read of the attribute at `path`
    pub fn get_value<T: AttributeValue>(&self, path: &AttributePath) -> Result<Value<T>> {
        Value::<T>::from_dynamic(self.get(path)?)
    }
}

/// Reads the top-level attributes of an object into typed values,
/// collecting one diagnostic per attribute that fails to decode
pub struct ObjectReader<'a> {
    value: &'a DynamicValue,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ObjectReader<'a> {
    pub fn new(value: &'a DynamicValue) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn get<T: AttributeValue>(&mut self, name: &str) -> Value<T> {
        let path = AttributePath::new(name);
        match self.value.get_value::<T>(&path) {
            Ok(v) => v,
            Err(e) => {
                self.diagnostics.push(
                    Diagnostic::error("Value Conversion Error", e.to_string()).with_attribute(path),
                );
                Value::Null
            }
        }
    }

    /// Ok when every attribute decoded cleanly
    pub fn finish(self) -> std::result::Result<(), Vec<Diagnostic>> {
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(self.diagnostics)
        }
    }
}

/// A typed view of a whole configuration, plan or state object
pub trait Model: Sized {
    fn from_value(value: &DynamicValue) -> std::result::Result<Self, Vec<Diagnostic>>;
    fn to_value(&self) -> DynamicValue;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_distinguishes_unknown_null_and_known() {
        let mut dv = DynamicValue::from_json(json!({"name": "web", "peer": null}));
        dv.mark_unknown(&AttributePath::new("id")).unwrap();

        let name: Value<String> = dv.get_value(&AttributePath::new("name")).unwrap();
        let peer: Value<String> = dv.get_value(&AttributePath::new("peer")).unwrap();
        let id: Value<String> = dv.get_value(&AttributePath::new("id")).unwrap();
        let missing: Value<String> = dv.get_value(&AttributePath::new("missing")).unwrap();

        assert_eq!(name, Value::Known("web".to_string()));
        assert!(peer.is_null());
        assert!(id.is_unknown());
        assert!(missing.is_null());
    }

    #[test]
    fn value_or_default_resolves_unset_to_zero_value() {
        assert_eq!(Value::<i64>::Unknown.value_or_default(), 0);
        assert!(!Value::<bool>::Null.value_or_default());
        assert_eq!(Value::Known(7_i64).value_or_default(), 7);
    }

    #[test]
    fn list_elements_keep_their_own_state() {
        let mut dv = DynamicValue::from_json(json!({"groups": ["a", null, "c"]}));
        dv.mark_unknown(&AttributePath::new("groups").index(2))
            .unwrap();

        let groups: List<String> = dv.get_value(&AttributePath::new("groups")).unwrap();
        let elements = groups.into_known().unwrap();
        assert_eq!(elements[0], Value::Known("a".to_string()));
        assert!(elements[1].is_null());
        assert!(elements[2].is_unknown());
    }

    #[test]
    fn integers_reject_fractions() {
        let dv = DynamicValue::from_json(json!({"metric": 1.5}));
        assert!(dv.get_value::<i64>(&AttributePath::new("metric")).is_err());
    }

    #[test]
    fn integers_reject_values_outside_i64() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert!(matches!(
            i64::from_dynamic(&Dynamic::Number(two_pow_63)),
            Err(TfplugError::DecodingError(_))
        ));
        assert!(i64::from_dynamic(&Dynamic::Number(-two_pow_63 * 2.0)).is_err());
        assert_eq!(
            i64::from_dynamic(&Dynamic::Number(-two_pow_63)).unwrap(),
            i64::MIN
        );
        assert_eq!(i64::from_dynamic(&Dynamic::Number(9999.0)).unwrap(), 9999);
    }

    #[test]
    fn object_reader_collects_conversion_errors() {
        let dv = DynamicValue::from_json(json!({"name": 42, "enabled": true}));
        let mut reader = ObjectReader::new(&dv);

        let name: Value<String> = reader.get("name");
        let enabled: Value<bool> = reader.get("enabled");

        assert!(name.is_null());
        assert_eq!(enabled, Value::Known(true));

        let diags = reader.finish().unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(AttributePath::new("name")));
    }

    #[test]
    fn known_list_round_trips_to_dynamic() {
        let list = List::from_elements(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            list.to_dynamic(),
            Dynamic::List(vec![
                Dynamic::String("a".to_string()),
                Dynamic::String("b".to_string())
            ])
        );
    }
}
