//! Stock batch models
//!
//! A batch is one received or produced lot of a product or preparation,
//! tracked with its FIFO unit cost until fully consumed. Batches are never
//! deleted; consumption drives them to zero or below, and negative batches
//! are later reconciled.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Department, ItemType, ReconciliationStatus};

/// One received or produced lot of stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_type: ItemType,
    /// Human-readable sequence identifier, unique per item
    pub batch_number: String,
    pub initial_quantity: Decimal,
    /// Signed: negative means over-consumption relative to recorded stock
    pub current_quantity: Decimal,
    pub unit: String,
    /// Monetary value per base unit, always >= 0
    pub cost_per_unit: Decimal,
    pub warehouse_id: Option<Uuid>,
    /// Why the batch went negative, when it did
    pub negative_reason: Option<String>,
    /// Set once a negative batch has been corrected; one-way transition
    pub reconciled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Batch {
    pub fn is_negative(&self) -> bool {
        self.current_quantity < Decimal::ZERO
    }

    /// Monetary value of the batch. Only batches with positive quantity
    /// contribute to valuation totals.
    pub fn value(&self) -> Decimal {
        self.current_quantity * self.cost_per_unit
    }

    /// Timestamp used for date-range filtering of negative-inventory events
    pub fn event_date(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn reconciliation_status(&self) -> ReconciliationStatus {
        if self.reconciled_at.is_some() {
            ReconciliationStatus::Reconciled
        } else {
            ReconciliationStatus::Unreconciled
        }
    }
}

/// Snapshot of a product or preparation as known to the catalog
///
/// The engine resolves batch and movement item references against this
/// snapshot; a batch whose item no longer resolves is skipped and counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub item_type: ItemType,
    pub department: Department,
    pub category: String,
    pub unit: String,
}

/// Result of a manual batch quantity correction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub batch_id: Uuid,
    pub old_balance: Decimal,
    pub new_balance: Decimal,
    /// Zero when the requested balance already matched; that is a no-op
    /// success, not an error.
    pub correction_amount: Decimal,
}

/// Result of reconciling a negative batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    pub batch: Batch,
    /// False when the batch had already been reconciled and the call was a
    /// no-op.
    pub newly_reconciled: bool,
}
