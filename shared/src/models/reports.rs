//! External report shapes
//!
//! Stable field sets consumed by the UI and exporters. Keyed groupings use
//! `BTreeMap` so every bucket is always present and serialization order is
//! deterministic.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CogsCalculation, ProductVarianceRow, ProductVarianceRowV2};
use crate::types::{CountCost, Department, ItemType, ReconciliationStatus, ReportPeriod};

// ============================================================================
// P&L Report
// ============================================================================

/// Amounts split between the two sales departments
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DepartmentAmounts {
    pub kitchen: Decimal,
    pub bar: Decimal,
}

/// Revenue section of the P&L
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RevenueSection {
    pub total: Decimal,
    pub by_department: DepartmentAmounts,
}

/// Profit line with margin percentage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ProfitLine {
    pub amount: Decimal,
    /// Percentage of revenue; 0 when revenue is 0
    pub margin: Decimal,
}

/// Manual inventory adjustments shown on the P&L
///
/// Negative batches are technical inventory records and do not appear here.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryAdjustments {
    /// Always positive for display
    pub losses: Decimal,
    /// Always positive for display
    pub gains: Decimal,
    /// Net impact: negative when losses exceed gains
    pub total: Decimal,
    pub by_category: AdjustmentCategories,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct AdjustmentCategories {
    pub spoilage: Decimal,
    pub shortage: Decimal,
    pub surplus: Decimal,
}

/// Operating expenses grouped by category
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpexSection {
    pub total: Decimal,
    pub by_category: BTreeMap<String, Decimal>,
}

/// Profit and Loss statement for a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PLReport {
    pub period: ReportPeriod,
    pub revenue: RevenueSection,
    pub cogs: CogsCalculation,
    pub gross_profit: ProfitLine,
    pub inventory_adjustments: InventoryAdjustments,
    pub opex: OpexSection,
    pub net_profit: ProfitLine,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Food Cost Dashboard
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct FoodCostSummary {
    pub revenue: Decimal,
    pub food_cost: Decimal,
    pub food_cost_percentage: Decimal,
    pub target_food_cost_percentage: Decimal,
    /// Actual vs target, in percentage points
    pub variance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFoodCost {
    pub date: NaiveDate,
    pub revenue: Decimal,
    pub food_cost: Decimal,
    pub food_cost_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCost {
    pub menu_item_id: Uuid,
    pub menu_item_name: String,
    pub variant_name: String,
    pub quantity_sold: Decimal,
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub cost_percentage: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DepartmentFoodCost {
    pub revenue: Decimal,
    pub cost: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FoodCostByDepartment {
    pub kitchen: DepartmentFoodCost,
    pub bar: DepartmentFoodCost,
}

/// Food cost percentage and trends for a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCostDashboard {
    pub period: ReportPeriod,
    pub summary: FoodCostSummary,
    /// Sorted ascending by date
    pub daily_breakdown: Vec<DailyFoodCost>,
    /// ALL sold items sorted by total cost descending, never truncated
    pub top_items_by_cost: Vec<MenuItemCost>,
    pub by_department: FoodCostByDepartment,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Inventory Valuation
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct TypeValuation {
    pub value: Decimal,
    pub batch_count: i64,
    /// Distinct items with at least one positive-quantity batch
    pub item_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValuationByType {
    pub products: TypeValuation,
    pub preparations: TypeValuation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct ValuationByDepartment {
    pub kitchen: Decimal,
    pub bar: Decimal,
    pub kitchen_and_bar: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseValuation {
    pub value: Decimal,
    pub batch_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuedItem {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_type: ItemType,
    pub department: Department,
    pub quantity: Decimal,
    pub unit: String,
    pub average_cost_per_unit: Decimal,
    pub total_value: Decimal,
}

/// Total value of inventory at a point in time (FIFO batch costs)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryValuation {
    pub calculated_at: DateTime<Utc>,
    pub total_value: Decimal,
    pub by_type: ValuationByType,
    pub by_department: ValuationByDepartment,
    /// Keyed by warehouse id, "unknown" for batches without one
    pub by_warehouse: BTreeMap<String, WarehouseValuation>,
    /// ALL items with a positive-quantity batch, sorted by value descending
    pub top_items: Vec<ValuedItem>,
    /// Batches whose item id no longer resolves; skipped, not raised
    pub skipped_batches: u32,
}

// ============================================================================
// Negative Inventory Report
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct NegativeInventorySummary {
    /// Unique items with negative batches in the period
    pub total_items: i64,
    /// Total negative batch events
    pub total_events: i64,
    pub total_cost_impact: Decimal,
    /// Batches still unreconciled
    pub unreconciled_batches: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeInventoryItem {
    pub item_id: Uuid,
    pub item_name: String,
    pub item_type: ItemType,
    pub category: String,
    pub department: Department,
    pub batch_id: Uuid,
    pub batch_number: String,
    pub batch_date: DateTime<Utc>,
    /// When the batch went negative
    pub event_date: DateTime<Utc>,
    /// Absolute value of the negative quantity
    pub negative_quantity: Decimal,
    pub unit: String,
    pub cost_per_unit: Decimal,
    /// `negative_quantity * cost_per_unit`
    pub total_cost: Decimal,
    pub status: ReconciliationStatus,
    pub reconciled_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NegativeByDepartment {
    pub kitchen: CountCost,
    pub bar: CountCost,
    pub kitchen_and_bar: CountCost,
    pub unknown: CountCost,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NegativeByStatus {
    pub unreconciled: CountCost,
    pub reconciled: CountCost,
    pub written_off: CountCost,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NegativeByItemType {
    pub products: CountCost,
    pub preparations: CountCost,
}

/// All negative batch events in a period and their financial impact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeInventoryReport {
    pub period: ReportPeriod,
    pub summary: NegativeInventorySummary,
    pub items: Vec<NegativeInventoryItem>,
    pub by_department: NegativeByDepartment,
    pub by_status: NegativeByStatus,
    pub by_item_type: NegativeByItemType,
    /// Batches whose item id no longer resolves; skipped, not raised
    pub skipped_batches: u32,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Variance Reports
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct VarianceSummary {
    pub total_products: i64,
    pub products_with_variance: i64,
    pub total_variance_amount: Decimal,
    pub total_received_amount: Decimal,
    pub total_sales_write_off_amount: Decimal,
    pub total_prep_write_off_amount: Decimal,
    pub total_loss_write_off_amount: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DepartmentVariance {
    pub count: i64,
    pub variance_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VarianceByDepartment {
    pub kitchen: DepartmentVariance,
    pub bar: DepartmentVariance,
}

/// Product variance report: Opening + Received - Sales - Loss - Closing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceReport {
    pub period: ReportPeriod,
    pub summary: VarianceSummary,
    pub by_department: VarianceByDepartment,
    pub items: Vec<ProductVarianceRow>,
    pub department_filter: Option<Department>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct VarianceSummaryV2 {
    pub total_products: i64,
    /// Products with sales or losses
    pub products_with_activity: i64,
    pub total_sales_amount: Decimal,
    pub total_loss_amount: Decimal,
    /// `total_loss / (total_sales + total_loss) * 100`
    pub overall_loss_percent: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DepartmentVarianceV2 {
    pub count: i64,
    pub sales_amount: Decimal,
    pub loss_amount: Decimal,
    pub loss_percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VarianceByDepartmentV2 {
    pub kitchen: DepartmentVarianceV2,
    pub bar: DepartmentVarianceV2,
}

/// Variance report V2 with theoretical-vs-actual decomposition traced
/// through preparations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceReportV2 {
    pub period: ReportPeriod,
    pub summary: VarianceSummaryV2,
    pub by_department: VarianceByDepartmentV2,
    pub items: Vec<ProductVarianceRowV2>,
    pub department_filter: Option<Department>,
    pub generated_at: DateTime<Utc>,
}
