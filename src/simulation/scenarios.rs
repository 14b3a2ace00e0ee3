//! Session-scoped scenario list.
//!
//! Scenarios live only as long as the store; there is no backend endpoint
//! for them. Views subscribe to the list and never mutate it themselves.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::simulation::customer::{Customer, ExecutionResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: i64,
    pub name: String,
    pub customer: Customer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_results: Option<ExecutionResult>,
    pub created_at: NaiveDateTime,
}

/// Owner of the scenario list.
pub struct ScenarioStore {
    tx: watch::Sender<Vec<Scenario>>,
}

impl Default for ScenarioStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Receiver that observes every change to the list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Scenario>> {
        self.tx.subscribe()
    }

    pub fn list(&self) -> Vec<Scenario> {
        self.tx.borrow().clone()
    }

    pub fn get(&self, id: i64) -> Option<Scenario> {
        self.tx.borrow().iter().find(|s| s.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a scenario. A blank name becomes
    /// `Scenario <customer name> - <timestamp>`.
    pub fn save(
        &self,
        name: &str,
        customer: Customer,
        expected_results: Option<ExecutionResult>,
    ) -> Scenario {
        let now = Local::now();
        let name = if name.trim().is_empty() {
            format!("Scenario {} - {}", customer.name, now.format("%Y-%m-%d %H:%M:%S"))
        } else {
            name.trim().to_string()
        };

        let mut scenario = Scenario {
            id: 0,
            name,
            customer,
            expected_results,
            created_at: now.naive_local(),
        };
        self.tx.send_modify(|scenarios| {
            // Millisecond ids, bumped when two saves land in the same millisecond.
            let last = scenarios.iter().map(|s| s.id).max().unwrap_or(0);
            scenario.id = now.timestamp_millis().max(last + 1);
            scenarios.push(scenario.clone());
        });

        tracing::debug!("Saved scenario {} '{}'", scenario.id, scenario.name);
        scenario
    }

    pub fn delete(&self, id: i64) -> bool {
        self.tx.send_if_modified(|scenarios| {
            let before = scenarios.len();
            scenarios.retain(|s| s.id != id);
            scenarios.len() != before
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> Customer {
        Customer {
            name: "Ana".to_string(),
            email: "ana@gmail.com".to_string(),
            ..Customer::default()
        }
    }

    #[test]
    fn test_save_names_and_ids() {
        let store = ScenarioStore::new();
        let first = store.save("", ana(), None);
        let second = store.save("  Big spender ", ana(), None);

        assert!(first.name.starts_with("Scenario Ana - "));
        assert_eq!(second.name, "Big spender");
        assert!(second.id > first.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete() {
        let store = ScenarioStore::new();
        let scenario = store.save("one", ana(), None);
        assert!(store.delete(scenario.id));
        assert!(!store.delete(scenario.id));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let store = ScenarioStore::new();
        let mut rx = store.subscribe();

        let scenario = store.save("watched", ana(), None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.delete(scenario.id);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());

        // Deleting a missing id does not wake subscribers.
        assert!(!store.delete(scenario.id));
        assert!(!rx.has_changed().unwrap());
    }
}
