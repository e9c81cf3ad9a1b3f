//! Validation utilities for the Resto Back-Office Platform

use rust_decimal::Decimal;

use crate::types::ReportPeriod;

/// Validate that a report period is well formed (start not after end)
pub fn validate_period(period: &ReportPeriod) -> Result<(), &'static str> {
    if period.date_from > period.date_to {
        return Err("Period start must not be after period end");
    }
    Ok(())
}

/// Validate that a unit cost is non-negative
pub fn validate_cost_per_unit(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Cost per unit cannot be negative");
    }
    Ok(())
}

/// Validate a target percentage is in a sane range
pub fn validate_target_percent(target: Decimal) -> Result<(), &'static str> {
    if target < Decimal::ZERO || target > Decimal::from(100) {
        return Err("Target percentage must be between 0 and 100");
    }
    Ok(())
}
