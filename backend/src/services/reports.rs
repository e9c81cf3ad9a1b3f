//! Report assembly: P&L, food-cost dashboard, CSV export
//!
//! The assembler composes the other services' outputs into the final
//! report shapes. COGS is computed once per report and reused; the same
//! breakdown feeds both the P&L profit lines and its inventory-adjustment
//! section.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    COGSBreakdown, CogsCalculation, DailyFoodCost, ExcludedReasons, ExpenseLine,
    FoodCostDashboard, InventoryAdjustments, MenuItemCost, NegativeInventoryReport, OpexSection,
    PLReport, ProfitLine, RevenueSection, SalesLine, VarianceReport,
};
use shared::types::{ratio_percent, CogsMethod, Department, ReportPeriod, RevenueBasis};

use crate::datasource::AnalyticsDataSource;
use crate::error::{AppError, AppResult};
use crate::services::cogs::CogsService;

/// Report-level policy knobs, taken from configuration at startup
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub target_food_cost_percent: Decimal,
    pub revenue_basis: RevenueBasis,
    pub cogs_method: CogsMethod,
    pub excluded_reasons: Option<ExcludedReasons>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            target_food_cost_percent: Decimal::from(30),
            revenue_basis: RevenueBasis::Net,
            cogs_method: CogsMethod::Accrual,
            excluded_reasons: None,
        }
    }
}

/// Sum sales lines into the P&L revenue section
pub fn revenue_section(sales: &[SalesLine], basis: RevenueBasis) -> RevenueSection {
    let mut section = RevenueSection::default();
    for line in sales {
        let revenue = line.revenue(basis);
        section.total += revenue;
        if line.department.matches(Department::Kitchen) {
            section.by_department.kitchen += revenue;
        }
        if line.department.matches(Department::Bar) {
            section.by_department.bar += revenue;
        }
    }
    section
}

/// Group expense lines into the OPEX section
pub fn build_opex(expenses: &[ExpenseLine]) -> OpexSection {
    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut total = Decimal::ZERO;
    for line in expenses {
        total += line.amount;
        *by_category.entry(line.category.clone()).or_default() += line.amount;
    }
    OpexSection { total, by_category }
}

/// Inventory adjustments shown alongside the P&L
///
/// Informational only: the accrual COGS total already carries spoilage,
/// shortage and surplus, so these amounts never feed the profit lines a
/// second time.
pub fn inventory_adjustments(breakdown: &COGSBreakdown) -> InventoryAdjustments {
    let losses = breakdown.spoilage.total + breakdown.shortage;
    let gains = breakdown.surplus;
    InventoryAdjustments {
        losses,
        gains,
        total: gains - losses,
        by_category: shared::models::AdjustmentCategories {
            spoilage: breakdown.spoilage.total,
            shortage: breakdown.shortage,
            surplus: breakdown.surplus,
        },
    }
}

/// Assemble the P&L from its computed sections
pub fn build_pl(
    period: ReportPeriod,
    revenue: RevenueSection,
    cogs: CogsCalculation,
    adjustments: InventoryAdjustments,
    opex: OpexSection,
    generated_at: DateTime<Utc>,
) -> PLReport {
    let gross_amount = revenue.total - cogs.total;
    let net_amount = gross_amount - opex.total;
    let gross_profit = ProfitLine {
        amount: gross_amount,
        margin: ratio_percent(gross_amount, revenue.total),
    };
    let net_profit = ProfitLine {
        amount: net_amount,
        margin: ratio_percent(net_amount, revenue.total),
    };
    PLReport {
        period,
        revenue,
        cogs,
        gross_profit,
        inventory_adjustments: adjustments,
        opex,
        net_profit,
        generated_at,
    }
}

/// Build the food-cost dashboard from sold menu item lines
pub fn build_food_cost(
    period: ReportPeriod,
    sales: &[SalesLine],
    basis: RevenueBasis,
    target_percent: Decimal,
    generated_at: DateTime<Utc>,
) -> FoodCostDashboard {
    let mut dashboard = FoodCostDashboard {
        period,
        summary: Default::default(),
        daily_breakdown: Vec::new(),
        top_items_by_cost: Vec::new(),
        by_department: Default::default(),
        generated_at,
    };

    let mut daily: BTreeMap<chrono::NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    let mut per_item: BTreeMap<(Uuid, String), MenuItemCost> = BTreeMap::new();

    for line in sales {
        let revenue = line.revenue(basis);
        dashboard.summary.revenue += revenue;
        dashboard.summary.food_cost += line.total_cost;

        let day = daily.entry(line.sold_at.date_naive()).or_default();
        day.0 += revenue;
        day.1 += line.total_cost;

        let item = per_item
            .entry((line.menu_item_id, line.variant_name.clone()))
            .or_insert_with(|| MenuItemCost {
                menu_item_id: line.menu_item_id,
                menu_item_name: line.menu_item_name.clone(),
                variant_name: line.variant_name.clone(),
                quantity_sold: Decimal::ZERO,
                total_revenue: Decimal::ZERO,
                total_cost: Decimal::ZERO,
                cost_percentage: Decimal::ZERO,
            });
        item.quantity_sold += line.quantity;
        item.total_revenue += revenue;
        item.total_cost += line.total_cost;

        if line.department.matches(Department::Kitchen) {
            dashboard.by_department.kitchen.revenue += revenue;
            dashboard.by_department.kitchen.cost += line.total_cost;
        }
        if line.department.matches(Department::Bar) {
            dashboard.by_department.bar.revenue += revenue;
            dashboard.by_department.bar.cost += line.total_cost;
        }
    }

    dashboard.summary.food_cost_percentage =
        ratio_percent(dashboard.summary.food_cost, dashboard.summary.revenue);
    dashboard.summary.target_food_cost_percentage = target_percent;
    dashboard.summary.variance = dashboard.summary.food_cost_percentage - target_percent;

    dashboard.daily_breakdown = daily
        .into_iter()
        .map(|(date, (revenue, food_cost))| DailyFoodCost {
            date,
            revenue,
            food_cost,
            food_cost_percentage: ratio_percent(food_cost, revenue),
        })
        .collect();

    let mut items: Vec<MenuItemCost> = per_item
        .into_values()
        .map(|mut item| {
            item.cost_percentage = ratio_percent(item.total_cost, item.total_revenue);
            item
        })
        .collect();
    // Full list, cost-descending
    items.sort_by(|a, b| {
        b.total_cost
            .cmp(&a.total_cost)
            .then_with(|| a.menu_item_name.cmp(&b.menu_item_name))
    });
    dashboard.top_items_by_cost = items;

    dashboard.by_department.kitchen.percentage = ratio_percent(
        dashboard.by_department.kitchen.cost,
        dashboard.by_department.kitchen.revenue,
    );
    dashboard.by_department.bar.percentage = ratio_percent(
        dashboard.by_department.bar.cost,
        dashboard.by_department.bar.revenue,
    );

    dashboard
}

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> AppResult<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

/// Export the variance report with its stable spreadsheet column order
pub fn variance_report_csv(report: &VarianceReport) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Product",
        "Code",
        "Unit",
        "Department",
        "Opening Qty",
        "Opening Amount",
        "Received Qty",
        "Received Amount",
        "Sales W/O Qty",
        "Sales W/O Amount",
        "Prep W/O Qty",
        "Prep W/O Amount",
        "Loss W/O Qty",
        "Loss W/O Amount",
        "Closing Qty",
        "Closing Amount",
        "Variance Qty",
        "Variance Amount",
    ])
    .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;

    for item in &report.items {
        wtr.write_record([
            item.product_name.clone(),
            item.product_code.clone().unwrap_or_default(),
            item.unit.clone(),
            item.department.as_str().to_string(),
            item.opening_stock.quantity.to_string(),
            item.opening_stock.amount.to_string(),
            item.received.quantity.to_string(),
            item.received.amount.to_string(),
            item.sales_write_off.quantity.to_string(),
            item.sales_write_off.amount.to_string(),
            item.prep_write_off.quantity.to_string(),
            item.prep_write_off.amount.to_string(),
            item.loss_write_off.quantity.to_string(),
            item.loss_write_off.amount.to_string(),
            item.closing_stock.quantity.to_string(),
            item.closing_stock.amount.to_string(),
            item.variance.quantity.to_string(),
            item.variance.amount.to_string(),
        ])
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }

    finish_csv(wtr)
}

/// Export the negative-inventory report with its stable column order
pub fn negative_inventory_csv(report: &NegativeInventoryReport) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Item Name",
        "Item Type",
        "Category",
        "Department",
        "Batch Number",
        "Event Date",
        "Negative Quantity",
        "Unit",
        "Cost Per Unit",
        "Total Cost",
        "Status",
        "Reason",
    ])
    .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;

    for item in &report.items {
        wtr.write_record([
            item.item_name.clone(),
            item.item_type.as_str().to_string(),
            item.category.clone(),
            item.department.as_str().to_string(),
            item.batch_number.clone(),
            item.event_date.format("%Y-%m-%d %H:%M").to_string(),
            item.negative_quantity.to_string(),
            item.unit.clone(),
            item.cost_per_unit.to_string(),
            item.total_cost.to_string(),
            item.status.as_str().to_string(),
            item.reason.clone(),
        ])
        .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }

    finish_csv(wtr)
}

/// Report assembly service
#[derive(Clone)]
pub struct ReportService {
    source: Arc<dyn AnalyticsDataSource>,
    cogs: CogsService,
    options: ReportOptions,
}

impl ReportService {
    pub fn new(source: Arc<dyn AnalyticsDataSource>, options: ReportOptions) -> Self {
        let cogs = CogsService::new(source.clone());
        Self {
            source,
            cogs,
            options,
        }
    }

    /// Profit and Loss statement for a period
    ///
    /// The P&L always includes every write-off reason; KPI-style exclusions
    /// never apply here.
    pub async fn pl_report(&self, period: ReportPeriod) -> AppResult<PLReport> {
        let sales = self.source.get_sales_lines(period).await?;
        let expenses = self.source.get_expense_lines(period).await?;
        let breakdown = self.cogs.breakdown(period, None, None).await?;
        let cogs = self
            .cogs
            .calculation_from_breakdown(period, self.options.cogs_method, &breakdown)
            .await?;

        Ok(build_pl(
            period,
            revenue_section(&sales, self.options.revenue_basis),
            cogs,
            inventory_adjustments(&breakdown),
            build_opex(&expenses),
            Utc::now(),
        ))
    }

    /// KPI-oriented COGS breakdown: the configured write-off reason
    /// exclusions apply here, unlike in the P&L
    pub async fn cogs_kpi(
        &self,
        period: ReportPeriod,
        department: Option<Department>,
    ) -> AppResult<COGSBreakdown> {
        self.cogs
            .breakdown(period, department, self.options.excluded_reasons.as_ref())
            .await
    }

    /// Food-cost dashboard for a period
    pub async fn food_cost_dashboard(&self, period: ReportPeriod) -> AppResult<FoodCostDashboard> {
        let sales = self.source.get_sales_lines(period).await?;
        Ok(build_food_cost(
            period,
            &sales,
            self.options.revenue_basis,
            self.options.target_food_cost_percent,
            Utc::now(),
        ))
    }
}
