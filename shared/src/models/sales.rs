//! Sales and expense line snapshots consumed by the report assembler

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Department, RevenueBasis};

/// One sold menu item line, with both revenue bases and its FIFO cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesLine {
    pub menu_item_id: Uuid,
    pub menu_item_name: String,
    pub variant_name: String,
    pub department: Department,
    pub sold_at: DateTime<Utc>,
    pub quantity: Decimal,
    /// After discounts, before tax
    pub actual_revenue: Decimal,
    /// Including service and local tax
    pub total_collected: Decimal,
    /// FIFO cost of the ingredients consumed by this line
    pub total_cost: Decimal,
}

impl SalesLine {
    /// Revenue under the selected denominator policy
    pub fn revenue(&self, basis: RevenueBasis) -> Decimal {
        match basis {
            RevenueBasis::Net => self.actual_revenue,
            RevenueBasis::Gross => self.total_collected,
        }
    }
}

/// One operating-expense line for the P&L OPEX section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub category: String,
    pub amount: Decimal,
}
