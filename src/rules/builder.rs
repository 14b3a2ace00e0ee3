//! Visual rule builder: condition and action rows rendered into rule text.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rules::model::{RuleDraft, RuleRecord};
use crate::rules::templates::builder_template;

/// Fields a condition can test, with their display labels.
pub const FIELDS: &[(&str, &str)] = &[
    ("age", "Age"),
    ("totalPurchases", "Total Purchases"),
    ("loyaltyPoints", "Loyalty Points"),
    ("customerSince", "Customer Since"),
    ("lastPurchase", "Last Purchase"),
];

pub const OPERATORS: &[(&str, &str)] = &[
    (">=", "Greater than or equal to"),
    ("<=", "Less than or equal to"),
    (">", "Greater than"),
    ("<", "Less than"),
    ("==", "Equal to"),
    ("!=", "Not equal to"),
];

pub const ACTION_TYPES: &[(&str, &str)] = &[
    ("setDiscount", "Apply Discount"),
    ("setVipCustomer", "Mark as VIP"),
    ("setLoyalCustomer", "Mark as Loyal"),
    ("setYoungCustomer", "Mark as Young"),
    ("setNewCustomer", "Mark as New"),
    ("setRecommendation", "Add Recommendation"),
    ("addLoyaltyPoints", "Add Points"),
];

const INDENT: &str = "        ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    #[default]
    And,
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::And => write!(f, "and"),
            Connector::Or => write!(f, "or"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: String,
    #[serde(default)]
    pub connector: Connector,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            field: "age".to_string(),
            operator: ">=".to_string(),
            value: String::new(),
            connector: Connector::And,
        }
    }
}

impl Condition {
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn render(&self) -> String {
        format!("{} {} {}", self.field, self.operator, format_value(&self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Default for RuleAction {
    fn default() -> Self {
        Self {
            kind: "setDiscount".to_string(),
            value: String::new(),
        }
    }
}

impl RuleAction {
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn render(&self) -> String {
        let statement = match self.kind.as_str() {
            "setDiscount" => format!("customer.setDiscount(\"{}\");", self.value),
            "setVipCustomer" => "customer.setVipCustomer(true);".to_string(),
            "setLoyalCustomer" => "customer.setLoyalCustomer(true);".to_string(),
            "setYoungCustomer" => "customer.setYoungCustomer(true);".to_string(),
            "setNewCustomer" => "customer.setNewCustomer(true);".to_string(),
            "setRecommendation" => format!("customer.setRecommendation(\"{}\");", self.value),
            "addLoyaltyPoints" => format!("customer.addLoyaltyPoints({});", self.value),
            other => format!("// Action: {} = {}", other, self.value),
        };
        format!("{}{}", INDENT, statement)
    }
}

/// Finite numbers stay bare, already-quoted strings are kept, anything else
/// is quoted.
fn format_value(value: &str) -> String {
    let value = value.trim();
    if value.parse::<f64>().is_ok_and(f64::is_finite) {
        return value.to_string();
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return value.to_string();
    }
    format!("\"{}\"", value)
}

/// Hint shown in an action's value input.
pub fn action_placeholder(kind: &str) -> &'static str {
    match kind {
        "setDiscount" => "e.g. 10% or Welcome10",
        "setVipCustomer" | "setLoyalCustomer" | "setYoungCustomer" | "setNewCustomer" => "true",
        "setRecommendation" => "e.g. Premium Products",
        "addLoyaltyPoints" => "e.g. 100",
        _ => "Enter a value",
    }
}

/// Editable rule under construction.
///
/// Starts with one blank condition and one blank action; blank rows are
/// kept in the lists but skipped when rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBuilder {
    pub name: String,
    pub description: String,
    conditions: Vec<Condition>,
    actions: Vec<RuleAction>,
    template: Option<&'static str>,
}

impl Default for RuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            conditions: vec![Condition::default()],
            actions: vec![RuleAction::default()],
            template: None,
        }
    }

    /// Start from a stored rule's name and description.
    ///
    /// Existing rule text is not parsed back into rows.
    pub fn from_rule(rule: &RuleRecord) -> Self {
        Self {
            name: rule.name.clone(),
            description: rule.description.clone(),
            ..Self::new()
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[RuleAction] {
        &self.actions
    }

    /// Template last applied, if any.
    pub fn template(&self) -> Option<&'static str> {
        self.template
    }

    pub fn add_condition(&mut self) -> &mut Condition {
        self.conditions.push(Condition::default());
        let last = self.conditions.len() - 1;
        &mut self.conditions[last]
    }

    pub fn push_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn condition_mut(&mut self, index: usize) -> Option<&mut Condition> {
        self.conditions.get_mut(index)
    }

    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn add_action(&mut self) -> &mut RuleAction {
        self.actions.push(RuleAction::default());
        let last = self.actions.len() - 1;
        &mut self.actions[last]
    }

    pub fn push_action(&mut self, action: RuleAction) {
        self.actions.push(action);
    }

    pub fn action_mut(&mut self, index: usize) -> Option<&mut RuleAction> {
        self.actions.get_mut(index)
    }

    pub fn remove_action(&mut self, index: usize) -> Option<RuleAction> {
        (index < self.actions.len()).then(|| self.actions.remove(index))
    }

    /// Overwrite name, description and both row lists from a preset.
    ///
    /// Returns `false` (and changes nothing) for an unknown key.
    pub fn apply_template(&mut self, key: &str) -> bool {
        let Some(template) = builder_template(key) else {
            tracing::warn!("Unknown rule template '{}'", key);
            return false;
        };
        self.name = template.name.to_string();
        self.description = template.description.to_string();
        self.conditions = template.conditions;
        self.actions = template.actions;
        self.template = Some(template.key);
        true
    }

    fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "New Rule"
        } else {
            &self.name
        }
    }

    /// Render the rule text.
    pub fn generate_text(&self) -> String {
        let conditions: Vec<&Condition> =
            self.conditions.iter().filter(|c| !c.is_blank()).collect();
        let when = if conditions.is_empty() {
            format!("{}// Add conditions", INDENT)
        } else {
            let mut joined = String::new();
            for (index, condition) in conditions.iter().enumerate() {
                if index > 0 {
                    joined.push_str(&format!(" {} ", condition.connector));
                }
                joined.push_str(&condition.render());
            }
            format!("{}customer: Customer({})", INDENT, joined)
        };

        let actions: Vec<String> = self
            .actions
            .iter()
            .filter(|a| !a.is_blank())
            .map(RuleAction::render)
            .collect();
        let then = if actions.is_empty() {
            format!("{}// Add actions", INDENT)
        } else {
            actions.join("\n")
        };

        format!(
            "rule \"{}\"\n    when\n{}\n    then\n{}\nend",
            self.display_name(),
            when,
            then
        )
    }

    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Rule name is missing".to_string());
        }
        if !self.generate_text().contains("rule \"") {
            errors.push("Rule declaration is missing".to_string());
        }
        if self.conditions.iter().all(Condition::is_blank) {
            errors.push("Add at least one condition".to_string());
        }
        if self.actions.iter().all(RuleAction::is_blank) {
            errors.push("Add at least one action".to_string());
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Back to one blank condition and one blank action.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The rule ready to be stored, or the reasons it is not.
    pub fn to_rule_draft(&self) -> Result<RuleDraft, Vec<String>> {
        let errors = self.validation_errors();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(RuleDraft::new(self.name.clone(), self.generate_text())
            .with_description(self.description.clone())
            .with_template("custom"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_builder_renders_placeholders() {
        let builder = RuleBuilder::new();
        let text = builder.generate_text();

        assert!(text.starts_with("rule \"New Rule\""));
        assert!(text.contains("// Add conditions"));
        assert!(text.contains("// Add actions"));
        assert!(text.ends_with("end"));
        assert!(!builder.is_valid());
    }

    #[test]
    fn test_vip_template() {
        let mut builder = RuleBuilder::new();
        assert!(builder.apply_template("vip"));

        assert_eq!(builder.conditions().len(), 2);
        assert_eq!(builder.actions().len(), 3);
        assert_eq!(builder.template(), Some("vip"));

        let expected = "rule \"VIP Customer\"\n    when\n        customer: Customer(totalPurchases >= 1000 and loyaltyPoints >= 500)\n    then\n        customer.setVipCustomer(true);\n        customer.setDiscount(\"15%\");\n        customer.setRecommendation(\"Premium Products\");\nend";
        assert_eq!(builder.generate_text(), expected);
        assert!(builder.is_valid());
    }

    #[test]
    fn test_unknown_template_changes_nothing() {
        let mut builder = RuleBuilder::new();
        builder.name = "Mine".to_string();
        assert!(!builder.apply_template("gold"));
        assert_eq!(builder.name, "Mine");
        assert_eq!(builder.conditions().len(), 1);
    }

    #[test]
    fn test_first_emitted_condition_has_no_connector() {
        let mut builder = RuleBuilder::new();
        // The default first row stays blank and is skipped.
        builder.push_condition(Condition {
            field: "age".to_string(),
            operator: "<".to_string(),
            value: "30".to_string(),
            connector: Connector::Or,
        });
        builder.push_condition(Condition {
            field: "lastPurchase".to_string(),
            operator: "==".to_string(),
            value: "yesterday".to_string(),
            connector: Connector::Or,
        });

        let text = builder.generate_text();
        assert!(text.contains("customer: Customer(age < 30 or lastPurchase == \"yesterday\")"));
    }

    #[test]
    fn test_value_formatting() {
        assert_eq!(format_value("30"), "30");
        assert_eq!(format_value("12.5"), "12.5");
        assert_eq!(format_value("\"gold\""), "\"gold\"");
        assert_eq!(format_value("gold"), "\"gold\"");
        assert_eq!(format_value("inf"), "\"inf\"");
        assert_eq!(format_value("NaN"), "\"NaN\"");
        assert_eq!(format_value("-infinity"), "\"-infinity\"");
    }

    #[test]
    fn test_unknown_action_becomes_comment() {
        let mut builder = RuleBuilder::new();
        builder.push_action(RuleAction {
            kind: "sendEmail".to_string(),
            value: "promo".to_string(),
        });
        assert!(builder.generate_text().contains("// Action: sendEmail = promo"));
    }

    #[test]
    fn test_validation_errors() {
        let mut builder = RuleBuilder::new();
        assert_eq!(
            builder.validation_errors(),
            vec![
                "Rule name is missing".to_string(),
                "Add at least one condition".to_string(),
                "Add at least one action".to_string(),
            ]
        );

        builder.name = "Adults".to_string();
        if let Some(condition) = builder.condition_mut(0) {
            condition.value = "18".to_string();
        }
        builder.add_action().value = "5%".to_string();
        assert!(builder.is_valid());

        let draft = builder.to_rule_draft().unwrap();
        assert_eq!(draft.name, "Adults");
        assert_eq!(draft.template, "custom");
        assert!(draft.content.contains("age >= 18"));
    }

    #[test]
    fn test_remove_rows_and_reset() {
        let mut builder = RuleBuilder::new();
        builder.apply_template("loyal");
        assert!(builder.remove_condition(5).is_none());
        assert!(builder.remove_condition(0).is_some());
        assert!(builder.remove_action(2).is_some());
        assert_eq!(builder.conditions().len(), 1);
        assert_eq!(builder.actions().len(), 2);

        builder.reset();
        assert_eq!(builder, RuleBuilder::new());
    }

    #[test]
    fn test_action_placeholders() {
        assert_eq!(action_placeholder("setVipCustomer"), "true");
        assert_eq!(action_placeholder("addLoyaltyPoints"), "e.g. 100");
        assert_eq!(action_placeholder("other"), "Enter a value");
    }
}
