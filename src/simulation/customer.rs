use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::entity::null_as_default;
use std::fmt;

/// Reasons a customer cannot be simulated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    NameRequired,
    EmailRequired,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::NameRequired => write!(f, "Customer name is required"),
            SimulationError::EmailRequired => write!(f, "Customer email is required"),
        }
    }
}

impl std::error::Error for SimulationError {}

/// Input of a rule execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub total_purchases: f64,
    pub loyalty_points: i64,
    pub days_since_registration: i64,
    pub is_active: bool,
}

impl Default for Customer {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            age: 30,
            total_purchases: 5000.0,
            loyalty_points: 500,
            days_since_registration: 30,
            is_active: true,
        }
    }
}

impl Customer {
    /// Name and email must be filled in before the rules are run.
    pub fn validate_for_simulation(&self) -> Result<(), SimulationError> {
        if self.name.trim().is_empty() {
            return Err(SimulationError::NameRequired);
        }
        if self.email.trim().is_empty() {
            return Err(SimulationError::EmailRequired);
        }
        Ok(())
    }
}

/// Customer fields echoed back, plus the classification and run metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub age: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub total_purchases: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub loyalty_points: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub days_since_registration: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_active: bool,

    #[serde(deserialize_with = "null_as_default")]
    pub vip_customer: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub loyal_customer: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub young_customer: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub new_customer: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub executed_rules: Vec<String>,
    /// Milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

impl ExecutionResult {
    /// A result carrying only the customer's own fields.
    pub fn for_customer(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            email: customer.email.clone(),
            age: customer.age,
            total_purchases: customer.total_purchases,
            loyalty_points: customer.loyalty_points,
            days_since_registration: customer.days_since_registration,
            is_active: customer.is_active,
            ..Self::default()
        }
    }

    /// The customer part of the result.
    pub fn customer(&self) -> Customer {
        Customer {
            name: self.name.clone(),
            email: self.email.clone(),
            age: self.age,
            total_purchases: self.total_purchases,
            loyalty_points: self.loyalty_points,
            days_since_registration: self.days_since_registration,
            is_active: self.is_active,
        }
    }
}

const SAMPLE_NAMES: &[&str] = &[
    "Ana Garcia",
    "Carlos Lopez",
    "Maria Rodriguez",
    "Juan Perez",
    "Laura Martin",
];
const SAMPLE_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com", "hotmail.com"];

/// A plausible customer drawn from `rng`.
pub fn random_customer_with<R: Rng + ?Sized>(rng: &mut R) -> Customer {
    let name = SAMPLE_NAMES.choose(rng).copied().unwrap_or("Ana Garcia");
    let domain = SAMPLE_DOMAINS.choose(rng).copied().unwrap_or("gmail.com");
    let email = format!("{}@{}", name.to_lowercase().replacen(' ', ".", 1), domain);

    Customer {
        name: name.to_string(),
        email,
        age: rng.gen_range(18..78),
        total_purchases: rng.gen_range(0..50_000) as f64,
        loyalty_points: rng.gen_range(0..5_000),
        days_since_registration: rng.gen_range(0..365),
        is_active: rng.gen_bool(0.8),
    }
}

pub fn random_customer() -> Customer {
    random_customer_with(&mut rand::thread_rng())
}
