//! Open records exchanged with the backend.
//!
//! Parametric tables share a handful of conventions (numeric id, audit
//! columns, `estado` / `estadoRegistro` flags) but otherwise carry whatever
//! columns the server declares. Records are therefore an ordered map from
//! field name to a tagged [`FieldValue`], instead of one struct per table.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::forms::FieldDescriptor;

/// Represents different types of field values in a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<FieldValue>),
    Map(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Empty in the sense of a `required` check: null, `""` or `[]`.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value; numeric strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            FieldValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Character count used by length rules; `None` for non-textual values.
    pub fn text_len(&self) -> Option<usize> {
        match self {
            FieldValue::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::List(l) => write!(f, "{:?}", l),
            FieldValue::Map(m) => write!(f, "{:?}", m),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        json_value_to_field_value(value)
    }
}

/// Helper function to convert serde_json::Value to FieldValue
fn json_value_to_field_value(value: serde_json::Value) -> FieldValue {
    match value {
        serde_json::Value::String(s) => FieldValue::String(s),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Null
            }
        }
        serde_json::Value::Bool(b) => FieldValue::Bool(b),
        serde_json::Value::Array(arr) => {
            FieldValue::List(arr.into_iter().map(json_value_to_field_value).collect())
        }
        serde_json::Value::Object(map) => FieldValue::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_value_to_field_value(v)))
                .collect(),
        ),
        serde_json::Value::Null => FieldValue::Null,
    }
}

/// Deserializes a field the backend may send as `null` into its default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error type for record operations
#[derive(Debug, Clone, PartialEq)]
pub enum EntityError {
    NotAnObject(String),
    UnknownField {
        entity: String,
        field: String,
    },
    RequiredFieldMissing {
        field: String,
    },
    InvalidFieldValue(String),
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotAnObject(found) => {
                write!(f, "Expected a JSON object, got {}", found)
            }
            EntityError::UnknownField { entity, field } => {
                write!(f, "Field '{}' is not declared for entity '{}'", field, entity)
            }
            EntityError::RequiredFieldMissing { field } => {
                write!(f, "Required field '{}' is missing or empty", field)
            }
            EntityError::InvalidFieldValue(msg) => {
                write!(f, "Invalid field value: {}", msg)
            }
        }
    }
}

impl std::error::Error for EntityError {}

/// Keys every parametric record may carry regardless of its declared fields.
pub const AUDIT_FIELDS: &[&str] = &[
    "id",
    "createdAt",
    "updatedAt",
    "createdBy",
    "updatedBy",
    "estado",
    "estadoRegistro",
];

/// A parametric record: identity and audit columns plus the open field map.
///
/// A record without `id` has never been persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(flatten)]
    pub fields: IndexMap<String, FieldValue>,
}

impl EntityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_i64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// Business status (`ACTIVO`, `INACTIVO`, ...).
    pub fn estado(&self) -> Option<&str> {
        self.get_str("estado")
    }

    /// Soft-delete flag; records default to live.
    pub fn is_live(&self) -> bool {
        self.get("estadoRegistro")
            .and_then(FieldValue::as_bool)
            .unwrap_or(true)
    }

    /// Parse a record from a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self, EntityError> {
        if !value.is_object() {
            return Err(EntityError::NotAnObject(json_kind(&value).to_string()));
        }
        serde_json::from_value(value).map_err(|e| EntityError::InvalidFieldValue(e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Flatten submitted form descriptors into a payload record.
    ///
    /// Descriptors without a value contribute `null`.
    pub fn from_descriptors(descriptors: &[FieldDescriptor]) -> Self {
        let mut record = Self::new();
        for descriptor in descriptors {
            record.set(
                descriptor.name.clone(),
                descriptor.value.clone().unwrap_or(FieldValue::Null),
            );
        }
        record
    }

    /// Compare two records on their open fields only, ignoring identity,
    /// audit columns and the soft-delete flag assigned by the server.
    pub fn same_content(&self, other: &EntityRecord) -> bool {
        let strip = |record: &EntityRecord| -> IndexMap<String, FieldValue> {
            record
                .fields
                .iter()
                .filter(|(k, _)| k.as_str() != "estadoRegistro")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        let (left, right) = (strip(self), strip(other));
        left.len() == right.len() && left.iter().all(|(k, v)| right.get(k) == Some(v))
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_untagged_roundtrip() {
        let value: FieldValue = serde_json::from_value(json!(5)).unwrap();
        assert_eq!(value, FieldValue::Int(5));

        let value: FieldValue = serde_json::from_value(json!(5.5)).unwrap();
        assert_eq!(value, FieldValue::Float(5.5));

        let value: FieldValue = serde_json::from_value(json!(null)).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::from("").is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
        assert!(!FieldValue::Int(0).is_empty());
    }

    #[test]
    fn test_numeric_strings_parse() {
        assert_eq!(FieldValue::from("12.5").as_f64(), Some(12.5));
        assert_eq!(FieldValue::from("2024").as_i64(), Some(2024));
        assert_eq!(FieldValue::from("abc").as_f64(), None);
    }

    #[test]
    fn test_record_from_json_keeps_audit_columns_apart() {
        let record = EntityRecord::from_json(json!({
            "id": 3,
            "monto": 5150.0,
            "anioVigencia": 2024,
            "estado": "ACTIVO",
            "createdAt": "2024-01-02T10:00:00"
        }))
        .unwrap();

        assert_eq!(record.id, Some(3));
        assert!(record.created_at.is_some());
        assert_eq!(record.get_f64("monto"), Some(5150.0));
        assert_eq!(record.get_i64("anioVigencia"), Some(2024));
        assert_eq!(record.estado(), Some("ACTIVO"));
        assert!(record.is_live());
        assert!(!record.fields.contains_key("id"));
    }

    #[test]
    fn test_record_rejects_non_objects() {
        let err = EntityRecord::from_json(json!("Backend unavailable")).unwrap_err();
        assert_eq!(err, EntityError::NotAnObject("string".to_string()));
    }

    #[test]
    fn test_same_content_ignores_identity() {
        let a = EntityRecord::new().with_field("codigo", "LP").with_field("anioVigencia", 2025);
        let mut b = a.clone();
        b.id = Some(9);
        b.created_at = chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        assert!(a.same_content(&b));

        b.set("codigo", "CP");
        assert!(!a.same_content(&b));
    }
}
