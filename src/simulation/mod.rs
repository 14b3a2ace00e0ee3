//! Customer simulation: inputs, the local classifier and saved scenarios.

pub mod classifier;
pub mod customer;
pub mod scenarios;

pub use classifier::classify;
pub use customer::{random_customer, random_customer_with, Customer, ExecutionResult, SimulationError};
pub use scenarios::{Scenario, ScenarioStore};
