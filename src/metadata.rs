//! Server-supplied field metadata.
//!
//! The backend describes each parametric table (field list, types, validators,
//! options, required / read-only sets) in its catalog. These types mirror that
//! payload; every member is optional on the wire.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::entity::{EntityError, EntityRecord, FieldValue, AUDIT_FIELDS};

/// Input kind of a form field.
///
/// Unknown kinds coming from the server degrade to [`FieldKind::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Email,
    Date,
    Textarea,
    Select,
    Boolean,
    Password,
    Year,
    Currency,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Email => "email",
            FieldKind::Date => "date",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Boolean => "boolean",
            FieldKind::Password => "password",
            FieldKind::Year => "year",
            FieldKind::Currency => "currency",
        }
    }

    /// Kinds whose value is free text (length and pattern rules apply).
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKind::Text | FieldKind::Email | FieldKind::Password | FieldKind::Textarea
        )
    }

    /// Kinds whose value is a number (min / max rules apply).
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Currency | FieldKind::Year)
    }

    /// Value a control of this kind starts from, and returns to on reset.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Boolean => FieldValue::Bool(false),
            FieldKind::Number => FieldValue::Int(0),
            FieldKind::Date | FieldKind::Select => FieldValue::Null,
            _ => FieldValue::String(String::new()),
        }
    }
}

impl From<String> for FieldKind {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "number" => FieldKind::Number,
            "email" => FieldKind::Email,
            "date" => FieldKind::Date,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "boolean" => FieldKind::Boolean,
            "password" => FieldKind::Password,
            "year" => FieldKind::Year,
            "currency" => FieldKind::Currency,
            _ => FieldKind::Text,
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation constraints attached to one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, alias = "filas", skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, alias = "fechaMin", skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    #[serde(default, alias = "fechaMax", skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
}

impl ValidationConstraints {
    pub fn is_empty(&self) -> bool {
        *self == ValidationConstraints::default()
    }

    /// Drop the constraints that have no meaning for `kind`.
    pub fn restricted_to(mut self, kind: FieldKind) -> Self {
        if !kind.is_numeric() {
            self.min = None;
            self.max = None;
            self.step = None;
        }
        if !kind.is_textual() {
            self.min_length = None;
            self.max_length = None;
            self.pattern = None;
            self.pattern_message = None;
        }
        if kind != FieldKind::Textarea {
            self.rows = None;
        }
        if kind != FieldKind::Date {
            self.min_date = None;
            self.max_date = None;
        }
        self
    }
}

/// One choice of a select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(alias = "valor")]
    pub value: FieldValue,
    #[serde(alias = "etiqueta")]
    pub label: String,
    #[serde(default, alias = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "deshabilitado")]
    pub disabled: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<FieldValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
            disabled: false,
        }
    }
}

/// Catalog entry describing one parametric table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParametricaMetadata {
    pub table_name: String,
    pub class_name: String,
    pub package_name: String,
    pub description: String,
    pub fields: Vec<String>,
    pub field_descriptions: HashMap<String, String>,
    pub field_types: HashMap<String, FieldKind>,
    pub field_validations: HashMap<String, ValidationConstraints>,
    pub field_options: HashMap<String, Vec<SelectOption>>,
    pub sections: HashMap<String, Vec<String>>,
    pub required_fields: Vec<String>,
    pub read_only_fields: Vec<String>,
    pub total_registros: Option<u64>,
    pub anios_disponibles: Vec<i32>,
    pub metadata_adicional: HashMap<String, serde_json::Value>,
}

impl ParametricaMetadata {
    /// Metadata declaring only a field list; convenient for tests and tooling.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn field_kind(&self, field: &str) -> FieldKind {
        self.field_types.get(field).copied().unwrap_or_default()
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required_fields.iter().any(|f| f == field)
    }

    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only_fields.iter().any(|f| f == field)
    }

    pub fn declares(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Admit a record received from the server.
    ///
    /// Every open field must be declared in `fields`; audit columns are
    /// always accepted.
    pub fn admit(&self, entity: &str, record: EntityRecord) -> Result<EntityRecord, EntityError> {
        for key in record.fields.keys() {
            if !self.declares(key) && !AUDIT_FIELDS.contains(&key.as_str()) {
                return Err(EntityError::UnknownField {
                    entity: entity.to_string(),
                    field: key.clone(),
                });
            }
        }
        Ok(record)
    }

    /// Check that `record` carries a non-empty value for every required field.
    pub fn check_required(&self, record: &EntityRecord) -> Result<(), EntityError> {
        for field in &self.required_fields {
            if field == "id" {
                continue;
            }
            let missing = record.get(field).map(FieldValue::is_empty).unwrap_or(true);
            if missing {
                return Err(EntityError::RequiredFieldMissing {
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The complete catalog of parametric tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Catalog {
    pub parametricas: IndexMap<String, ParametricaMetadata>,
    pub total_parametricas: Option<usize>,
    pub fecha_generacion: Option<NaiveDateTime>,
    pub version: Option<String>,
}

impl Catalog {
    /// Look an entry up by catalog key, falling back to the hyphenated
    /// endpoint spelling (`tipo_proceso` / `tipo-proceso`).
    pub fn metadata(&self, name: &str) -> Option<&ParametricaMetadata> {
        self.parametricas
            .get(name)
            .or_else(|| self.parametricas.get(&name.replace('-', "_")))
            .or_else(|| self.parametricas.get(&name.replace('_', "-")))
    }

    pub fn names(&self) -> Vec<&String> {
        self.parametricas.keys().collect()
    }
}
