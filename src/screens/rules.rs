use std::sync::Arc;

use crate::client::RulesClient;
use crate::notify::Notifier;
use crate::rules::{RuleBuilder, RuleDraft, RuleRecord};

/// Rule list with create / edit / delete / toggle.
pub struct RulesScreen {
    client: RulesClient,
    notifier: Arc<dyn Notifier>,
    rules: Vec<RuleRecord>,
}

impl RulesScreen {
    pub fn new(client: RulesClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            rules: Vec::new(),
        }
    }

    pub fn rules(&self) -> &[RuleRecord] {
        &self.rules
    }

    pub fn rule(&self, id: i64) -> Option<&RuleRecord> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub async fn load(&mut self) {
        self.rules = self.client.list_rules().await;
        tracing::debug!("Rules screen holds {} rules", self.rules.len());
    }

    pub async fn create(&mut self, draft: RuleDraft) -> Option<RuleRecord> {
        if !draft.is_complete() {
            self.notifier.warning("Rule name and content are required");
            return None;
        }
        let rule = self.client.create_rule(&draft).await;
        self.notifier.success("Rule created successfully");
        self.load().await;
        Some(rule)
    }

    /// Create a rule from the visual builder, reporting its validation
    /// errors instead when it is incomplete.
    pub async fn create_from_builder(&mut self, builder: &RuleBuilder) -> Option<RuleRecord> {
        match builder.to_rule_draft() {
            Ok(draft) => self.create(draft).await,
            Err(errors) => {
                self.notifier.warning(&errors.join(". "));
                None
            }
        }
    }

    pub async fn update(&mut self, rule: RuleRecord) -> RuleRecord {
        let updated = self.client.update_rule(&rule).await;
        self.notifier.success("Rule updated successfully");
        self.load().await;
        updated
    }

    pub async fn delete(&mut self, id: i64) -> bool {
        if self.client.delete_rule(id).await {
            self.notifier.success("Rule deleted successfully");
            self.load().await;
            true
        } else {
            self.notifier.error("Error deleting the rule");
            false
        }
    }

    pub async fn toggle(&mut self, id: i64) -> RuleRecord {
        let rule = self.client.toggle_rule(id).await;
        let state = if rule.active { "activated" } else { "deactivated" };
        self.notifier.success(&format!("Rule {}", state));
        self.load().await;
        rule
    }
}
