//! Canned rules.
//!
//! Two families live here: builder presets (condition and action rows the
//! visual builder is filled with) and engine-text templates, which also back
//! the default rule list served when the backend cannot be reached.

use crate::rules::builder::{Condition, Connector, RuleAction};
use crate::rules::model::RuleRecord;

/// Keys accepted by [`builder_template`] and [`drl_template`].
pub const TEMPLATE_KEYS: &[&str] = &["vip", "loyal", "young", "new"];

pub const VIP_RULE: &str = "VIP Customer";
pub const LOYAL_RULE: &str = "Loyal Customer";
pub const YOUNG_RULE: &str = "Young Customer";
pub const NEW_RULE: &str = "New Customer";

/// Builder preset: what `apply_template` writes into the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub conditions: Vec<Condition>,
    pub actions: Vec<RuleAction>,
}

fn and(field: &str, operator: &str, value: &str) -> Condition {
    Condition {
        field: field.to_string(),
        operator: operator.to_string(),
        value: value.to_string(),
        connector: Connector::And,
    }
}

fn action(kind: &str, value: &str) -> RuleAction {
    RuleAction {
        kind: kind.to_string(),
        value: value.to_string(),
    }
}

pub fn builder_template(key: &str) -> Option<RuleTemplate> {
    let template = match key {
        "vip" => RuleTemplate {
            key: "vip",
            name: VIP_RULE,
            description: "Identify and reward VIP customers",
            conditions: vec![
                and("totalPurchases", ">=", "1000"),
                and("loyaltyPoints", ">=", "500"),
            ],
            actions: vec![
                action("setVipCustomer", "true"),
                action("setDiscount", "15%"),
                action("setRecommendation", "Premium Products"),
            ],
        },
        "loyal" => RuleTemplate {
            key: "loyal",
            name: LOYAL_RULE,
            description: "Customers with high loyalty",
            conditions: vec![
                and("loyaltyPoints", ">=", "200"),
                and("totalPurchases", ">=", "300"),
            ],
            actions: vec![
                action("setLoyalCustomer", "true"),
                action("setDiscount", "10%"),
                action("setRecommendation", "Special Offers"),
            ],
        },
        "young" => RuleTemplate {
            key: "young",
            name: YOUNG_RULE,
            description: "Special rule for young customers",
            conditions: vec![and("age", "<", "30")],
            actions: vec![
                action("setYoungCustomer", "true"),
                action("setDiscount", "5%"),
                action("setRecommendation", "Trending Products"),
            ],
        },
        "new" => RuleTemplate {
            key: "new",
            name: NEW_RULE,
            description: "Welcome for new customers",
            conditions: vec![and("totalPurchases", "<", "50")],
            actions: vec![
                action("setNewCustomer", "true"),
                action("setDiscount", "Welcome10"),
                action("setRecommendation", "Popular Products"),
            ],
        },
        _ => return None,
    };
    Some(template)
}

/// Engine text for a template key; `custom` yields an empty skeleton.
pub fn drl_template(key: &str) -> Option<&'static str> {
    let text = match key {
        "vip" => {
            r#"rule "VIP Customer"
when
    $customer : Customer(totalPurchases > 10000)
then
    $customer.setVipCustomer(true);
    $customer.setCategory("VIP");
    $customer.setDiscount("25% VIP discount");
end"#
        }
        "loyal" => {
            r#"rule "Loyal Customer"
when
    $customer : Customer(loyaltyPoints >= 1000)
then
    $customer.setLoyalCustomer(true);
end"#
        }
        "young" => {
            r#"rule "Young Customer"
when
    $customer : Customer(age < 30)
then
    $customer.setYoungCustomer(true);
    $customer.setDiscount("10% youth discount");
end"#
        }
        "new" => {
            r#"rule "New Customer"
when
    $customer : Customer(daysSinceRegistration == 0)
then
    $customer.setNewCustomer(true);
    $customer.setRecommendation("Welcome! Discover our products");
end"#
        }
        "custom" => {
            r#"rule "My Custom Rule"
when
    $customer : Customer(/* condition */)
then
    /* actions */
end"#
        }
        _ => return None,
    };
    Some(text)
}

/// Rules shown when the backend list cannot be fetched.
pub fn default_rules() -> Vec<RuleRecord> {
    let rule = |id: i64, key: &str, name: &str, description: &str, active: bool| RuleRecord {
        id,
        name: name.to_string(),
        description: description.to_string(),
        template: key.to_string(),
        content: drl_template(key).unwrap_or_default().to_string(),
        active,
        created_at: None,
        updated_at: None,
    };

    vec![
        rule(1, "vip", VIP_RULE, "Classifies customers with purchases above $10,000", true),
        rule(2, "loyal", LOYAL_RULE, "Identifies customers with 1000+ loyalty points", true),
        rule(3, "young", YOUNG_RULE, "Segments customers under 30", true),
        rule(4, "new", NEW_RULE, "Identifies newly registered customers", false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_both_forms() {
        for key in TEMPLATE_KEYS {
            assert!(builder_template(key).is_some(), "builder preset for {}", key);
            assert!(drl_template(key).is_some(), "engine text for {}", key);
        }
        assert!(builder_template("custom").is_none());
        assert!(drl_template("custom").is_some());
        assert!(drl_template("gold").is_none());
    }

    #[test]
    fn test_default_rules() {
        let rules = default_rules();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules.iter().filter(|r| r.active).count(), 3);
        assert!(!rules[3].active);
        assert!(rules
            .iter()
            .all(|r| r.content.starts_with(&format!("rule \"{}\"", r.name))));
    }
}
