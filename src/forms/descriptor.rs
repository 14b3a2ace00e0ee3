use serde::{Deserialize, Serialize};

use crate::entity::FieldValue;
use crate::metadata::{FieldKind, SelectOption, ValidationConstraints};

/// Layout width of a field inside its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldWidth {
    Full,
    #[default]
    Half,
    Third,
    Quarter,
    Auto,
}

/// A fully decorated form field, derived from metadata at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub width: FieldWidth,
    pub section: String,
    pub order: usize,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ValidationConstraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}

impl FieldDescriptor {
    /// A bare descriptor; the generator fills in the decorations.
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            read_only: false,
            width: FieldWidth::default(),
            section: String::new(),
            order: 0,
            placeholder: String::new(),
            help: String::new(),
            icon: String::new(),
            prefix: None,
            suffix: None,
            options: None,
            constraints: None,
            value: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_constraints(mut self, constraints: ValidationConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }
}
