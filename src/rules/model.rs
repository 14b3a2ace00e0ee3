use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored rule as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template tag the rule was built from (`vip`, `loyal`, ..., `custom`).
    #[serde(default)]
    pub template: String,
    /// Engine rule text.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl RuleRecord {
    /// Attach an identity to a draft.
    pub fn from_draft(id: i64, draft: RuleDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            template: draft.template,
            content: draft.content,
            active: draft.active,
            created_at: None,
            updated_at: None,
        }
    }

    /// Editable part of the rule.
    pub fn to_draft(&self) -> RuleDraft {
        RuleDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            template: self.template.clone(),
            content: self.content.clone(),
            active: self.active,
        }
    }
}

/// A rule that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template: String,
    pub content: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RuleDraft {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            template: "custom".to_string(),
            content: content.into(),
            active: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Name and content are mandatory before anything is sent.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.content.trim().is_empty()
    }
}
