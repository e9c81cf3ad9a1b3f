//! Variance reconciliation over consolidated stock movements
//!
//! For every product and period the stock identity must close:
//! opening + received - sales - loss = closing + in_preparations.
//! Whatever does not close is the variance, classified as shortage or
//! surplus with an exact zero tolerance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::models::{
    ProductMovementRecord, ProductVarianceDetail, ProductVarianceRow, ProductVarianceRowV2,
    TracedTotals, VarianceDetailRecord, VarianceInterpretation, VarianceReport, VarianceReportV2,
};
use shared::types::{ratio_percent, Department, ReportPeriod};

use crate::datasource::AnalyticsDataSource;
use crate::error::{AppError, AppResult};

/// Close the stock identity for one product
pub fn reconcile_product(record: &ProductMovementRecord) -> ProductVarianceRow {
    let variance = record.movement.variance();
    ProductVarianceRow {
        product_id: record.product_id,
        product_name: record.product_name.clone(),
        product_code: record.product_code.clone(),
        unit: record.unit.clone(),
        department: record.department,
        opening_stock: record.movement.opening,
        received: record.movement.received,
        sales_write_off: record.movement.sales,
        prep_write_off: record.movement.in_preparations,
        loss_write_off: record.movement.loss,
        closing_stock: record.movement.closing,
        variance,
        sales_writeoff_diff: record.movement.sales_writeoff_diff(),
        interpretation: VarianceInterpretation::classify(variance.amount),
    }
}

/// Build the variance report for a period
pub fn build_report(
    period: ReportPeriod,
    records: &[ProductMovementRecord],
    department_filter: Option<Department>,
    generated_at: DateTime<Utc>,
) -> VarianceReport {
    let mut report = VarianceReport {
        period,
        summary: Default::default(),
        by_department: Default::default(),
        items: Vec::new(),
        department_filter,
        generated_at,
    };

    for record in records {
        if let Some(filter) = department_filter {
            if !record.department.matches(filter) {
                continue;
            }
        }

        let row = reconcile_product(record);

        report.summary.total_products += 1;
        if !row.variance.amount.is_zero() {
            report.summary.products_with_variance += 1;
        }
        report.summary.total_variance_amount += row.variance.amount;
        report.summary.total_received_amount += row.received.amount;
        report.summary.total_sales_write_off_amount += row.sales_write_off.amount;
        report.summary.total_prep_write_off_amount += row.prep_write_off.amount;
        report.summary.total_loss_write_off_amount += row.loss_write_off.amount;

        // Shared items count against both departments
        if row.department.matches(Department::Kitchen) {
            report.by_department.kitchen.count += 1;
            report.by_department.kitchen.variance_amount += row.variance.amount;
        }
        if row.department.matches(Department::Bar) {
            report.by_department.bar.count += 1;
            report.by_department.bar.variance_amount += row.variance.amount;
        }

        report.items.push(row);
    }

    // Largest absolute residual first
    report.items.sort_by(|a, b| {
        b.variance
            .amount
            .abs()
            .cmp(&a.variance.amount.abs())
            .then_with(|| a.product_name.cmp(&b.product_name))
    });

    report
}

fn row_v2(record: &ProductMovementRecord) -> ProductVarianceRowV2 {
    let direct_sales = record.movement.sales;
    let direct_loss = record.movement.loss;
    let sales = direct_sales + record.traced_sales;
    let loss = direct_loss + record.traced_loss;
    ProductVarianceRowV2 {
        product_id: record.product_id,
        product_name: record.product_name.clone(),
        product_code: record.product_code.clone(),
        unit: record.unit.clone(),
        department: record.department,
        sales,
        loss,
        direct_sales,
        direct_loss,
        traced_sales: record.traced_sales,
        traced_loss: record.traced_loss,
        has_preparations: !record.traced_sales.is_zero() || !record.traced_loss.is_zero(),
        loss_percent: ratio_percent(loss.amount, sales.amount + loss.amount),
    }
}

/// Build the V2 variance report with preparation traceability
pub fn build_report_v2(
    period: ReportPeriod,
    records: &[ProductMovementRecord],
    department_filter: Option<Department>,
    generated_at: DateTime<Utc>,
) -> VarianceReportV2 {
    let mut report = VarianceReportV2 {
        period,
        summary: Default::default(),
        by_department: Default::default(),
        items: Vec::new(),
        department_filter,
        generated_at,
    };

    for record in records {
        if let Some(filter) = department_filter {
            if !record.department.matches(filter) {
                continue;
            }
        }

        let row = row_v2(record);

        report.summary.total_products += 1;
        if !row.sales.is_zero() || !row.loss.is_zero() {
            report.summary.products_with_activity += 1;
        }
        report.summary.total_sales_amount += row.sales.amount;
        report.summary.total_loss_amount += row.loss.amount;

        if row.department.matches(Department::Kitchen) {
            report.by_department.kitchen.count += 1;
            report.by_department.kitchen.sales_amount += row.sales.amount;
            report.by_department.kitchen.loss_amount += row.loss.amount;
        }
        if row.department.matches(Department::Bar) {
            report.by_department.bar.count += 1;
            report.by_department.bar.sales_amount += row.sales.amount;
            report.by_department.bar.loss_amount += row.loss.amount;
        }

        report.items.push(row);
    }

    report.summary.overall_loss_percent = ratio_percent(
        report.summary.total_loss_amount,
        report.summary.total_sales_amount + report.summary.total_loss_amount,
    );
    report.by_department.kitchen.loss_percent = ratio_percent(
        report.by_department.kitchen.loss_amount,
        report.by_department.kitchen.sales_amount + report.by_department.kitchen.loss_amount,
    );
    report.by_department.bar.loss_percent = ratio_percent(
        report.by_department.bar.loss_amount,
        report.by_department.bar.sales_amount + report.by_department.bar.loss_amount,
    );

    // Worst loss ratio first
    report.items.sort_by(|a, b| {
        b.loss_percent
            .cmp(&a.loss_percent)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });

    report
}

/// Assemble the drill-down detail for a single product
pub fn build_detail(
    record: VarianceDetailRecord,
    period: ReportPeriod,
    generated_at: DateTime<Utc>,
) -> ProductVarianceDetail {
    let traced_totals = record.preparations.iter().fold(
        TracedTotals::default(),
        |mut totals, prep| {
            totals.sales_quantity += prep.traced_sales.quantity;
            totals.sales_amount += prep.traced_sales.amount;
            totals.loss_quantity += prep.traced_loss.quantity;
            totals.loss_amount += prep.traced_loss.amount;
            totals
        },
    );

    ProductVarianceDetail {
        product_id: record.product_id,
        product_name: record.product_name,
        product_code: record.product_code,
        unit: record.unit,
        department: record.department,
        period,
        receipts: record.receipts,
        direct_sales: record.direct_sales,
        direct_loss: record.direct_loss,
        production: record.production,
        loss_by_reason: record.loss_by_reason,
        preparations: record.preparations,
        traced_totals,
        generated_at,
    }
}

/// Variance reconciliation service
#[derive(Clone)]
pub struct VarianceService {
    source: Arc<dyn AnalyticsDataSource>,
}

impl VarianceService {
    pub fn new(source: Arc<dyn AnalyticsDataSource>) -> Self {
        Self { source }
    }

    pub async fn report(
        &self,
        period: ReportPeriod,
        department_filter: Option<Department>,
    ) -> AppResult<VarianceReport> {
        let records = self.source.get_product_movements(period).await?;
        Ok(build_report(period, &records, department_filter, Utc::now()))
    }

    pub async fn report_v2(
        &self,
        period: ReportPeriod,
        department_filter: Option<Department>,
    ) -> AppResult<VarianceReportV2> {
        let records = self.source.get_product_movements(period).await?;
        Ok(build_report_v2(
            period,
            &records,
            department_filter,
            Utc::now(),
        ))
    }

    pub async fn product_detail(
        &self,
        product_id: Uuid,
        period: ReportPeriod,
    ) -> AppResult<ProductVarianceDetail> {
        let record = self
            .source
            .get_product_variance_detail(product_id, period)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        Ok(build_detail(record, period, Utc::now()))
    }
}
