//! COGS aggregation
//!
//! A single authoritative COGS figure per period, computed on both
//! accounting bases. The accrual basis comes straight from the store's
//! aggregate breakdown; the cash basis is reconstructed from payments,
//! accounts payable deltas and inventory endpoints, substituting the
//! current valuation when historical snapshots are missing.

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::models::{
    AccrualCogs, CashBasisInputs, CashCogs, COGSBreakdown, CogsCalculation, ExcludedReasons,
};
use shared::types::{CogsMethod, Department, ReportPeriod};

use crate::datasource::AnalyticsDataSource;
use crate::error::AppResult;
use crate::services::costing;

/// Accrual basis from the store's aggregate breakdown
pub fn accrual_from_breakdown(breakdown: &COGSBreakdown) -> AccrualCogs {
    let total = breakdown.sales_cogs + breakdown.spoilage.total + breakdown.shortage
        - breakdown.surplus;
    AccrualCogs {
        sales_cogs: breakdown.sales_cogs,
        spoilage: breakdown.spoilage.total,
        shortage: breakdown.shortage,
        surplus: breakdown.surplus,
        total,
    }
}

/// Cash basis from raw inputs
///
/// `fallback_valuation` stands in for both inventory endpoints when the
/// store has no point-in-time snapshots; the result is flagged so callers
/// can tell the approximation apart from real endpoints.
pub fn cash_from_inputs(inputs: &CashBasisInputs, fallback_valuation: Decimal) -> CashCogs {
    let uses_valuation_proxy =
        inputs.opening_inventory.is_none() || inputs.closing_inventory.is_none();
    let opening_inventory = inputs.opening_inventory.unwrap_or(fallback_valuation);
    let closing_inventory = inputs.closing_inventory.unwrap_or(fallback_valuation);

    let accounts_payable_delta =
        inputs.closing_accounts_payable - inputs.opening_accounts_payable;
    let total =
        opening_inventory + inputs.purchases - accounts_payable_delta - closing_inventory;

    CashCogs {
        opening_inventory,
        closing_inventory,
        inventory_change: closing_inventory - opening_inventory,
        purchases: inputs.purchases,
        opening_accounts_payable: inputs.opening_accounts_payable,
        closing_accounts_payable: inputs.closing_accounts_payable,
        accounts_payable_delta,
        total,
        uses_valuation_proxy,
    }
}

/// Combine both bases, selecting the configured method's total
pub fn combine(method: CogsMethod, accrual: AccrualCogs, cash: CashCogs) -> CogsCalculation {
    let total = match method {
        CogsMethod::Accrual => accrual.total,
        CogsMethod::Cash => cash.total,
    };
    CogsCalculation {
        method,
        accrual,
        cash,
        total,
    }
}

/// COGS aggregation service
#[derive(Clone)]
pub struct CogsService {
    source: Arc<dyn AnalyticsDataSource>,
}

impl CogsService {
    pub fn new(source: Arc<dyn AnalyticsDataSource>) -> Self {
        Self { source }
    }

    /// Aggregate COGS breakdown for a period, optionally restricted to one
    /// department
    pub async fn breakdown(
        &self,
        period: ReportPeriod,
        department: Option<Department>,
        excluded: Option<&ExcludedReasons>,
    ) -> AppResult<COGSBreakdown> {
        self.source
            .get_cogs_by_date_range(period, department, excluded)
            .await
    }

    /// Both COGS bases for a period
    pub async fn calculation(
        &self,
        period: ReportPeriod,
        method: CogsMethod,
        excluded: Option<&ExcludedReasons>,
    ) -> AppResult<CogsCalculation> {
        let breakdown = self.breakdown(period, None, excluded).await?;
        self.calculation_from_breakdown(period, method, &breakdown)
            .await
    }

    /// Both COGS bases, reusing an already-fetched breakdown
    pub async fn calculation_from_breakdown(
        &self,
        period: ReportPeriod,
        method: CogsMethod,
        breakdown: &COGSBreakdown,
    ) -> AppResult<CogsCalculation> {
        let inputs = self.source.get_cash_basis_inputs(period).await?;

        // The proxy valuation is only fetched when it will actually be used
        let fallback = if inputs.opening_inventory.is_none() || inputs.closing_inventory.is_none()
        {
            let batches = self.source.get_active_batches().await?;
            costing::total_batch_value(&batches)
        } else {
            Decimal::ZERO
        };

        let accrual = accrual_from_breakdown(breakdown);
        let cash = cash_from_inputs(&inputs, fallback);
        Ok(combine(method, accrual, cash))
    }
}
