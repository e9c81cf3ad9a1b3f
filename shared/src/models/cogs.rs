//! Cost-of-Goods-Sold models
//!
//! A single authoritative COGS figure is computed once and reused by the
//! P&L report, the Food-Cost dashboard and the monthly KPI. Two accounting
//! bases are always computed side by side; the caller selects which feeds
//! the P&L profit lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CogsMethod, Department, ReportPeriod};

/// Spoilage write-offs broken down by reason
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SpoilageBreakdown {
    pub total: Decimal,
    pub expired: Decimal,
    pub spoiled: Decimal,
    pub other: Decimal,
}

/// Write-off reasons excluded from KPI-oriented COGS
///
/// Named configuration, never a hard-coded rule: KPI consumers exclude
/// reasons like "education" or "test" while the P&L includes everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ExcludedReasons {
    pub storage: Vec<String>,
    pub preparation: Vec<String>,
}

impl ExcludedReasons {
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty() && self.preparation.is_empty()
    }
}

/// Aggregate COGS breakdown for a period, as answered by the data source
///
/// Invariant: `total_cogs = sales_cogs + spoilage.total + shortage - surplus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct COGSBreakdown {
    pub period: ReportPeriod,
    /// Department the aggregates were restricted to, if any
    pub department: Option<Department>,
    pub revenue: Decimal,
    /// FIFO cost of sales-driven consumption
    pub sales_cogs: Decimal,
    pub spoilage: SpoilageBreakdown,
    /// Inventory adjustment write-offs
    pub shortage: Decimal,
    /// Inventory adjustment additions
    pub surplus: Decimal,
    pub total_cogs: Decimal,
    /// `total_cogs / revenue * 100`, 0 when revenue is 0
    pub total_cogs_percent: Decimal,
    pub generated_at: DateTime<Utc>,
    pub excluded_reasons: Option<ExcludedReasons>,
}

/// Accrual-basis COGS: cost tied to consumption events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct AccrualCogs {
    pub sales_cogs: Decimal,
    pub spoilage: Decimal,
    pub shortage: Decimal,
    pub surplus: Decimal,
    /// `sales_cogs + spoilage + shortage - surplus`
    pub total: Decimal,
}

/// Cash-basis COGS: what was actually paid for consumed goods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CashCogs {
    pub opening_inventory: Decimal,
    pub closing_inventory: Decimal,
    /// `closing_inventory - opening_inventory`
    pub inventory_change: Decimal,
    /// Payments to suppliers during the period
    pub purchases: Decimal,
    pub opening_accounts_payable: Decimal,
    pub closing_accounts_payable: Decimal,
    /// `closing_ap - opening_ap`; an increase means more bought on credit
    pub accounts_payable_delta: Decimal,
    /// `opening_inventory + purchases - ap_delta - closing_inventory`
    pub total: Decimal,
    /// True when historical inventory snapshots were unavailable and the
    /// current valuation was substituted for both ends of the period.
    /// Callers must be able to detect the approximation.
    pub uses_valuation_proxy: bool,
}

/// Both COGS bases side by side, with the selected method's total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CogsCalculation {
    pub method: CogsMethod,
    pub accrual: AccrualCogs,
    pub cash: CashCogs,
    /// Total of the selected method
    pub total: Decimal,
}

/// Raw inputs for the cash basis, as answered by the data source
///
/// The inventory endpoints are optional: a store without point-in-time
/// valuation support answers `None` and the aggregator substitutes the
/// current valuation, flagging the proxy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CashBasisInputs {
    pub purchases: Decimal,
    pub opening_accounts_payable: Decimal,
    pub closing_accounts_payable: Decimal,
    pub opening_inventory: Option<Decimal>,
    pub closing_inventory: Option<Decimal>,
}
