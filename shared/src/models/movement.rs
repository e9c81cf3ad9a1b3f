//! Stock movement and variance models
//!
//! The variance reconciler reconstructs the stock-movement identity per
//! product per period:
//!
//! ```text
//! expected = opening + received - sales - loss
//! actual   = closing + in_preparations
//! variance = expected - actual
//! ```
//!
//! Theoretical sales (recipe decomposition of sold menu items) and actual
//! write-offs (recorded consumption) are reconciled against each other;
//! their difference is itself diagnostic and reported explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Department, ReportPeriod, StockAmount};

/// Consolidated stock movement for one product over one period
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsolidatedMovement {
    pub opening: StockAmount,
    pub received: StockAmount,
    /// Theoretical sales: recipe decomposition of sold menu items
    pub sales: StockAmount,
    /// Actual recorded consumption operations
    pub writeoffs: StockAmount,
    pub loss: StockAmount,
    pub gain: StockAmount,
    pub closing: StockAmount,
    /// Stock sitting inside preparations at period end
    pub in_preparations: StockAmount,
}

impl ConsolidatedMovement {
    pub fn expected(&self) -> StockAmount {
        self.opening + self.received - self.sales - self.loss
    }

    pub fn actual(&self) -> StockAmount {
        self.closing + self.in_preparations
    }

    /// Residual variance, `expected - actual`
    pub fn variance(&self) -> StockAmount {
        self.expected() - self.actual()
    }

    /// Theoretical sales minus recorded write-offs. A nonzero value points
    /// at recipe definitions drifting from real consumption.
    pub fn sales_writeoff_diff(&self) -> StockAmount {
        self.sales - self.writeoffs
    }
}

/// Interpretation of a variance residual
///
/// Arithmetic is `Decimal` and therefore exact for these sums and products,
/// so the tolerance is exactly zero: a zero amount is balanced, any nonzero
/// signed residual is shortage (negative) or surplus (positive).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VarianceInterpretation {
    Balanced,
    Shortage,
    Surplus,
}

impl VarianceInterpretation {
    pub fn classify(variance_amount: Decimal) -> Self {
        if variance_amount.is_zero() {
            VarianceInterpretation::Balanced
        } else if variance_amount < Decimal::ZERO {
            VarianceInterpretation::Shortage
        } else {
            VarianceInterpretation::Surplus
        }
    }
}

/// Raw per-product movement record as answered by the data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMovementRecord {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub unit: String,
    pub department: Department,
    pub movement: ConsolidatedMovement,
    /// Sales attributed to this product through preparations it went into
    pub traced_sales: StockAmount,
    /// Loss one level down the preparation tree, surfaced for drill-down
    /// and never summed twice into the top-level loss figure
    pub traced_loss: StockAmount,
}

/// One row of the Product Variance Report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVarianceRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub unit: String,
    pub department: Department,
    pub opening_stock: StockAmount,
    pub received: StockAmount,
    pub sales_write_off: StockAmount,
    pub prep_write_off: StockAmount,
    pub loss_write_off: StockAmount,
    pub closing_stock: StockAmount,
    pub variance: StockAmount,
    pub sales_writeoff_diff: StockAmount,
    pub interpretation: VarianceInterpretation,
}

/// One row of the Variance Report V2, with preparation traceability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVarianceRowV2 {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub unit: String,
    pub department: Department,
    /// Direct plus traced
    pub sales: StockAmount,
    /// Direct plus traced
    pub loss: StockAmount,
    pub direct_sales: StockAmount,
    pub direct_loss: StockAmount,
    pub traced_sales: StockAmount,
    pub traced_loss: StockAmount,
    pub has_preparations: bool,
    /// `loss.amount / (sales.amount + loss.amount) * 100`, 0 when the
    /// denominator is 0
    pub loss_percent: Decimal,
}

/// Write-off loss reasons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    Expired,
    Spoiled,
    Other,
}

impl LossReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossReason::Expired => "expired",
            LossReason::Spoiled => "spoiled",
            LossReason::Other => "other",
        }
    }
}

/// Loss breakdown entry for the variance drill-down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossBreakdownItem {
    pub reason: LossReason,
    pub quantity: Decimal,
    pub amount: Decimal,
}

/// Receipt entry for the variance drill-down
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptEntry {
    pub receipt_date: NaiveDate,
    pub quantity: Decimal,
    pub amount: Decimal,
    pub supplier_name: Option<String>,
}

/// How much of a product went into one preparation, and what came back out
/// as traced sales and losses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationBreakdown {
    pub preparation_id: Uuid,
    pub preparation_name: String,
    pub production: StockAmount,
    pub traced_sales: StockAmount,
    pub traced_loss: StockAmount,
}

/// Raw drill-down record as answered by the data source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceDetailRecord {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub unit: String,
    pub department: Department,
    pub receipts: Vec<ReceiptEntry>,
    pub direct_sales: StockAmount,
    pub direct_loss: StockAmount,
    pub production: StockAmount,
    pub loss_by_reason: Vec<LossBreakdownItem>,
    pub preparations: Vec<PreparationBreakdown>,
}

/// Traced totals across all preparations of one product
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TracedTotals {
    pub sales_quantity: Decimal,
    pub sales_amount: Decimal,
    pub loss_quantity: Decimal,
    pub loss_amount: Decimal,
}

/// Full variance drill-down for a single product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVarianceDetail {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub unit: String,
    pub department: Department,
    pub period: ReportPeriod,
    pub receipts: Vec<ReceiptEntry>,
    pub direct_sales: StockAmount,
    pub direct_loss: StockAmount,
    pub production: StockAmount,
    pub loss_by_reason: Vec<LossBreakdownItem>,
    pub preparations: Vec<PreparationBreakdown>,
    pub traced_totals: TracedTotals,
    pub generated_at: DateTime<Utc>,
}
