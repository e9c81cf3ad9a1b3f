//! Common types used across the platform

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Department an item or sale belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Kitchen,
    Bar,
    /// Items used by both kitchen and bar
    KitchenAndBar,
    Unknown,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Kitchen => "kitchen",
            Department::Bar => "bar",
            Department::KitchenAndBar => "kitchen_and_bar",
            Department::Unknown => "unknown",
        }
    }

    /// Whether an item in this department is visible under the given filter.
    /// Shared items match both single-department filters.
    pub fn matches(&self, filter: Department) -> bool {
        match (self, filter) {
            (a, b) if *a == b => true,
            (Department::KitchenAndBar, Department::Kitchen) => true,
            (Department::KitchenAndBar, Department::Bar) => true,
            _ => false,
        }
    }
}

/// Product vs preparation duality
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Raw product received from suppliers
    Product,
    /// Semi-finished item produced in-house from raw products
    Preparation,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Preparation => "preparation",
        }
    }
}

/// Reconciliation state of a negative batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Unreconciled,
    Reconciled,
    /// Closed out without correction. Set externally, never derived here.
    WrittenOff,
}

impl ReconciliationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::Unreconciled => "unreconciled",
            ReconciliationStatus::Reconciled => "reconciled",
            ReconciliationStatus::WrittenOff => "written_off",
        }
    }
}

/// COGS accounting basis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CogsMethod {
    /// Cost tied to consumption events
    #[default]
    Accrual,
    /// Cost tied to payment and inventory-change timing
    Cash,
}

/// Revenue denominator policy for food-cost percentages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBasis {
    /// Actual revenue, net of tax (after discounts, before tax)
    #[default]
    Net,
    /// Total collected, including service and local tax
    Gross,
}

/// A stock movement expressed as quantity plus monetary amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StockAmount {
    pub quantity: Decimal,
    pub amount: Decimal,
}

impl StockAmount {
    pub fn new(quantity: Decimal, amount: Decimal) -> Self {
        Self { quantity, amount }
    }

    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero() && self.amount.is_zero()
    }
}

impl std::ops::Add for StockAmount {
    type Output = StockAmount;

    fn add(self, rhs: StockAmount) -> StockAmount {
        StockAmount {
            quantity: self.quantity + rhs.quantity,
            amount: self.amount + rhs.amount,
        }
    }
}

impl std::ops::Sub for StockAmount {
    type Output = StockAmount;

    fn sub(self, rhs: StockAmount) -> StockAmount {
        StockAmount {
            quantity: self.quantity - rhs.quantity,
            amount: self.amount - rhs.amount,
        }
    }
}

impl std::ops::AddAssign for StockAmount {
    fn add_assign(&mut self, rhs: StockAmount) {
        self.quantity += rhs.quantity;
        self.amount += rhs.amount;
    }
}

/// Inclusive date range for report generation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportPeriod {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl ReportPeriod {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self { date_from, date_to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.date_from && date <= self.date_to
    }
}

/// Count plus cost bucket used by report aggregations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CountCost {
    pub count: i64,
    pub cost: Decimal,
}

impl CountCost {
    pub fn record(&mut self, cost: Decimal) {
        self.count += 1;
        self.cost += cost;
    }
}

/// Zero-safe percentage: `part / whole * 100`, or 0 when `whole` is 0.
///
/// Percentages in reports must always be finite, even for periods with no
/// revenue or no sales.
pub fn ratio_percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::from(100)
    }
}
