//! Negative-inventory lifecycle: reporting, reconciliation, correction
//!
//! A batch that has been consumed past zero stays on the ledger with a
//! negative quantity until someone reconciles it. Reconciliation stamps the
//! batch exactly once; repeating the call is a visible no-op, never an
//! error and never a second stamp.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    Batch, CatalogItem, CorrectionResult, NegativeInventoryItem, NegativeInventoryReport,
    ReconcileOutcome,
};
use shared::types::{CountCost, Department, ItemType, ReconciliationStatus, ReportPeriod};

use crate::datasource::AnalyticsDataSource;
use crate::error::{AppError, AppResult};

/// Build the negative-inventory report from the raw negative batch set
pub fn build_report(
    period: ReportPeriod,
    catalog: &[CatalogItem],
    batches: &[Batch],
    generated_at: DateTime<Utc>,
) -> NegativeInventoryReport {
    let items_by_id: std::collections::HashMap<Uuid, &CatalogItem> =
        catalog.iter().map(|item| (item.id, item)).collect();

    let mut report = NegativeInventoryReport {
        period,
        summary: Default::default(),
        items: Vec::new(),
        by_department: Default::default(),
        by_status: Default::default(),
        by_item_type: Default::default(),
        skipped_batches: 0,
        generated_at,
    };

    let mut distinct_items: HashSet<Uuid> = HashSet::new();

    for batch in batches {
        if !batch.is_negative() {
            continue;
        }
        if !period.contains(batch.event_date().date_naive()) {
            continue;
        }
        let Some(item) = items_by_id.get(&batch.item_id) else {
            report.skipped_batches += 1;
            continue;
        };

        let negative_quantity = -batch.current_quantity;
        let total_cost = negative_quantity * batch.cost_per_unit;
        let status = batch.reconciliation_status();

        distinct_items.insert(item.id);
        report.summary.total_events += 1;
        report.summary.total_cost_impact += total_cost;
        if status == ReconciliationStatus::Unreconciled {
            report.summary.unreconciled_batches += 1;
        }

        department_bucket(&mut report.by_department, item.department).record(total_cost);
        status_bucket(&mut report.by_status, status).record(total_cost);
        match item.item_type {
            ItemType::Product => report.by_item_type.products.record(total_cost),
            ItemType::Preparation => report.by_item_type.preparations.record(total_cost),
        }

        report.items.push(NegativeInventoryItem {
            item_id: item.id,
            item_name: item.name.clone(),
            item_type: item.item_type,
            category: item.category.clone(),
            department: item.department,
            batch_id: batch.id,
            batch_number: batch.batch_number.clone(),
            batch_date: batch.created_at,
            event_date: batch.event_date(),
            negative_quantity,
            unit: batch.unit.clone(),
            cost_per_unit: batch.cost_per_unit,
            total_cost,
            status,
            reconciled_at: batch.reconciled_at,
            reason: batch
                .negative_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            notes: batch.notes.clone(),
        });
    }

    report.summary.total_items = distinct_items.len() as i64;
    // Most expensive events first
    report
        .items
        .sort_by(|a, b| b.total_cost.cmp(&a.total_cost));

    report
}

fn department_bucket(
    buckets: &mut shared::models::NegativeByDepartment,
    department: Department,
) -> &mut CountCost {
    match department {
        Department::Kitchen => &mut buckets.kitchen,
        Department::Bar => &mut buckets.bar,
        Department::KitchenAndBar => &mut buckets.kitchen_and_bar,
        Department::Unknown => &mut buckets.unknown,
    }
}

fn status_bucket(
    buckets: &mut shared::models::NegativeByStatus,
    status: ReconciliationStatus,
) -> &mut CountCost {
    match status {
        ReconciliationStatus::Unreconciled => &mut buckets.unreconciled,
        ReconciliationStatus::Reconciled => &mut buckets.reconciled,
        ReconciliationStatus::WrittenOff => &mut buckets.written_off,
    }
}

/// Negative-inventory service
#[derive(Clone)]
pub struct NegativeInventoryService {
    source: Arc<dyn AnalyticsDataSource>,
}

impl NegativeInventoryService {
    pub fn new(source: Arc<dyn AnalyticsDataSource>) -> Self {
        Self { source }
    }

    /// Negative-inventory report for a period
    pub async fn report(&self, period: ReportPeriod) -> AppResult<NegativeInventoryReport> {
        let catalog = self.source.get_catalog_items().await?;
        let batches = self.source.get_all_negative_batches(None).await?;
        let report = build_report(period, &catalog, &batches, Utc::now());
        if report.skipped_batches > 0 {
            tracing::warn!(
                skipped = report.skipped_batches,
                "negative batches referencing unknown catalog items were excluded"
            );
        }
        Ok(report)
    }

    /// Reconcile a negative batch. Idempotent: the first call stamps the
    /// batch, later calls return the stamped batch with
    /// `newly_reconciled = false`.
    pub async fn reconcile(
        &self,
        batch_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<ReconcileOutcome> {
        if let Some(batch) = self.source.mark_batch_reconciled(batch_id, notes).await? {
            tracing::info!(batch_id = %batch_id, "Reconciled negative batch");
            return Ok(ReconcileOutcome {
                batch,
                newly_reconciled: true,
            });
        }

        // The keyed update matched nothing: either the batch is gone or a
        // previous call already stamped it.
        match self.source.get_batch(batch_id).await? {
            Some(batch) => Ok(ReconcileOutcome {
                batch,
                newly_reconciled: false,
            }),
            None => Err(AppError::NotFound("Batch".to_string())),
        }
    }

    /// Set a batch balance to an absolute value
    ///
    /// A correction to the current balance is a no-op success with a zero
    /// correction amount, so callers can blindly re-submit.
    pub async fn correct_quantity(
        &self,
        batch_id: Uuid,
        new_balance: Decimal,
    ) -> AppResult<CorrectionResult> {
        let batch = self
            .source
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        let old_balance = batch.current_quantity;
        if old_balance == new_balance {
            return Ok(CorrectionResult {
                batch_id,
                old_balance,
                new_balance,
                correction_amount: Decimal::ZERO,
            });
        }

        let updated = self
            .source
            .set_batch_quantity(batch_id, new_balance)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        tracing::info!(
            batch_id = %batch_id,
            %old_balance,
            new_balance = %updated.current_quantity,
            "Corrected batch balance"
        );

        Ok(CorrectionResult {
            batch_id,
            old_balance,
            new_balance: updated.current_quantity,
            correction_amount: new_balance - old_balance,
        })
    }
}
