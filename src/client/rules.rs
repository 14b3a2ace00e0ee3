//! Rules service. Every call degrades to a local value when the backend is
//! unreachable, so the console stays usable offline.

use chrono::{Local, NaiveDateTime};
use std::time::Duration;

use crate::client::{ApiResult, HttpClient};
use crate::rules::{default_rules, RuleDraft, RuleRecord};
use crate::simulation::{classify, Customer, ExecutionResult};

#[derive(Debug, Clone)]
pub struct RulesClient {
    http: HttpClient,
    execute_timeout: Duration,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl RulesClient {
    pub fn new(http: HttpClient, execute_timeout: Duration) -> Self {
        Self {
            http,
            execute_timeout,
        }
    }

    /// Stored rules, or the built-in defaults when the backend fails.
    pub async fn list_rules(&self) -> Vec<RuleRecord> {
        self.try_list_rules().await.unwrap_or_else(|e| {
            tracing::warn!("Loading rules failed ({}), using defaults", e);
            default_rules()
        })
    }

    pub async fn try_list_rules(&self) -> ApiResult<Vec<RuleRecord>> {
        self.http.get("rules", &[]).await
    }

    /// Store a new rule. Offline, the draft is echoed back with a
    /// millisecond-timestamp id.
    pub async fn create_rule(&self, draft: &RuleDraft) -> RuleRecord {
        match self.http.post("rules", draft, None).await {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!("Creating rule failed ({}), echoing locally", e);
                let created = now();
                let mut rule = RuleRecord::from_draft(Local::now().timestamp_millis(), draft.clone());
                rule.created_at = Some(created);
                rule.updated_at = Some(created);
                rule
            }
        }
    }

    /// Replace a rule. Offline, the input comes back with a fresh `updatedAt`.
    pub async fn update_rule(&self, rule: &RuleRecord) -> RuleRecord {
        match self.http.put(&format!("rules/{}", rule.id), rule).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!("Updating rule {} failed ({}), echoing locally", rule.id, e);
                RuleRecord {
                    updated_at: Some(now()),
                    ..rule.clone()
                }
            }
        }
    }

    pub async fn delete_rule(&self, id: i64) -> bool {
        match self.http.delete(&format!("rules/{}", id)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Deleting rule {} failed: {}", id, e);
                false
            }
        }
    }

    /// Flip a rule's active flag. Offline, a placeholder active rule with
    /// the requested id is returned.
    pub async fn toggle_rule(&self, id: i64) -> RuleRecord {
        match self.http.patch(&format!("rules/{}/toggle", id)).await {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!("Toggling rule {} failed ({}), returning placeholder", id, e);
                RuleRecord {
                    id,
                    name: "Mock Rule".to_string(),
                    description: "Mock Description".to_string(),
                    template: "custom".to_string(),
                    content: "mock content".to_string(),
                    active: true,
                    created_at: None,
                    updated_at: Some(now()),
                }
            }
        }
    }

    /// Run the engine on `customer`, falling back to the local classifier on
    /// any failure or after the execution timeout.
    pub async fn execute_rules(&self, customer: &Customer) -> ExecutionResult {
        let call = self
            .http
            .post::<_, ExecutionResult>("rules/execute", customer, Some(self.execute_timeout));

        match tokio::time::timeout(self.execute_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!("Rule execution failed ({}), classifying locally", e);
                classify(customer)
            }
            Err(_) => {
                tracing::warn!(
                    "Rule execution exceeded {:?}, classifying locally",
                    self.execute_timeout
                );
                classify(customer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 9 locally; every call takes the fallback path.
    fn offline() -> RulesClient {
        RulesClient::new(HttpClient::new("http://127.0.0.1:9/api"), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_offline_list_returns_defaults() {
        let rules = offline().list_rules().await;
        assert_eq!(rules, default_rules());
    }

    #[tokio::test]
    async fn test_offline_create_echoes_draft() {
        let draft = RuleDraft::new("Weekend", "rule \"Weekend\" when then end");
        let rule = offline().create_rule(&draft).await;
        assert_eq!(rule.name, "Weekend");
        assert!(rule.id > 0);
        assert!(rule.created_at.is_some());
        assert_eq!(rule.created_at, rule.updated_at);
    }

    #[tokio::test]
    async fn test_offline_toggle_and_delete() {
        let client = offline();
        let rule = client.toggle_rule(42).await;
        assert_eq!(rule.id, 42);
        assert_eq!(rule.name, "Mock Rule");
        assert!(rule.active);
        assert!(!client.delete_rule(42).await);
    }

    #[tokio::test]
    async fn test_offline_execute_classifies_locally() {
        let customer = Customer {
            name: "Ana".to_string(),
            email: "ana@gmail.com".to_string(),
            total_purchases: 20_000.0,
            ..Customer::default()
        };
        let result = offline().execute_rules(&customer).await;
        assert!(result.vip_customer);
        assert_eq!(result.success, Some(true));
    }
}
