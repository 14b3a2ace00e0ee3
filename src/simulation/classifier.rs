//! Local stand-in for the rules engine.

use std::time::Instant;

use crate::rules::templates::{LOYAL_RULE, NEW_RULE, VIP_RULE, YOUNG_RULE};
use crate::simulation::customer::{Customer, ExecutionResult};

pub const VIP_DISCOUNT: &str = "25% VIP discount";
pub const YOUTH_DISCOUNT: &str = "10% youth discount";
pub const WELCOME_RECOMMENDATION: &str = "Welcome! Discover our products";

/// Classify `customer` with the four built-in rules.
///
/// Rules fire independently. The discount goes to the first rule that sets
/// one (VIP before youth).
pub fn classify(customer: &Customer) -> ExecutionResult {
    let started = Instant::now();
    let mut result = ExecutionResult::for_customer(customer);

    if customer.total_purchases > 10_000.0 {
        result.vip_customer = true;
        result.discount = Some(VIP_DISCOUNT.to_string());
        result.executed_rules.push(VIP_RULE.to_string());
    }

    if customer.loyalty_points >= 1000 {
        result.loyal_customer = true;
        result.executed_rules.push(LOYAL_RULE.to_string());
    }

    if customer.age < 30 {
        result.young_customer = true;
        result
            .discount
            .get_or_insert_with(|| YOUTH_DISCOUNT.to_string());
        result.executed_rules.push(YOUNG_RULE.to_string());
    }

    if customer.days_since_registration == 0 {
        result.new_customer = true;
        result.recommendation = Some(WELCOME_RECOMMENDATION.to_string());
        result.executed_rules.push(NEW_RULE.to_string());
    }

    result.execution_time = Some(started.elapsed().as_millis() as u64);
    result.success = Some(true);
    result
}
