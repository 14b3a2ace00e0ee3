use std::sync::Arc;

use crate::client::RulesClient;
use crate::notify::Notifier;
use crate::simulation::{random_customer, Customer, ExecutionResult, Scenario, ScenarioStore};

/// Customer simulator with saved scenarios.
pub struct SimulatorScreen {
    client: RulesClient,
    scenarios: Arc<ScenarioStore>,
    notifier: Arc<dyn Notifier>,
    pub customer: Customer,
    last_result: Option<ExecutionResult>,
}

impl SimulatorScreen {
    pub fn new(client: RulesClient, scenarios: Arc<ScenarioStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            scenarios,
            notifier,
            customer: Customer::default(),
            last_result: None,
        }
    }

    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios.list()
    }

    /// Run the rules for the current customer.
    pub async fn simulate(&mut self) -> Option<&ExecutionResult> {
        if let Err(e) = self.customer.validate_for_simulation() {
            self.notifier.warning(&e.to_string());
            return None;
        }
        let result = self.client.execute_rules(&self.customer).await;
        tracing::debug!("Executed rules: {:?}", result.executed_rules);
        self.notifier.success("Simulation completed successfully");
        self.last_result = Some(result);
        self.last_result.as_ref()
    }

    pub fn randomize(&mut self) {
        self.customer = random_customer();
        self.notifier.info("Random customer generated");
    }

    /// Save the current customer and its last result. Requires a prior run.
    pub fn save_scenario(&mut self, name: &str) -> Option<Scenario> {
        let Some(result) = self.last_result.clone() else {
            self.notifier.warning("Run a simulation first");
            return None;
        };
        let scenario = self
            .scenarios
            .save(name, self.customer.clone(), Some(result));
        self.notifier.success("Scenario saved successfully");
        Some(scenario)
    }

    /// Restore a scenario's customer and run it again.
    pub async fn load_scenario(&mut self, id: i64) -> Option<&ExecutionResult> {
        let Some(scenario) = self.scenarios.get(id) else {
            self.notifier.error(&format!("Scenario {} not found", id));
            return None;
        };
        self.customer = scenario.customer;
        self.simulate().await
    }

    pub fn delete_scenario(&mut self, id: i64) -> bool {
        if self.scenarios.delete(id) {
            self.notifier.success("Scenario deleted");
            true
        } else {
            self.notifier.error("Error deleting the scenario");
            false
        }
    }

    pub fn reset(&mut self) {
        self.customer = Customer::default();
        self.last_result = None;
    }
}
