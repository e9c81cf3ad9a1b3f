//! In-memory data source for tests and local development
//!
//! Holds fixture data behind a mutex and honours the same update semantics
//! as the PostgreSQL implementation, in particular the keyed reconcile
//! update that makes reconciliation idempotent.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    Batch, CashBasisInputs, CatalogItem, COGSBreakdown, ExcludedReasons, ExpenseLine,
    ProductMovementRecord, SalesLine, SpoilageBreakdown, VarianceDetailRecord,
};
use shared::types::{ratio_percent, Department, ReportPeriod};

use crate::datasource::AnalyticsDataSource;
use crate::error::AppResult;

/// Fixture-backed data source
#[derive(Default)]
pub struct InMemoryDataSource {
    catalog: Vec<CatalogItem>,
    batches: Mutex<Vec<Batch>>,
    movements: Vec<ProductMovementRecord>,
    details: HashMap<Uuid, VarianceDetailRecord>,
    sales: Vec<SalesLine>,
    expenses: Vec<ExpenseLine>,
    cash_inputs: CashBasisInputs,
    cogs: CogsFixture,
}

/// Raw COGS aggregates the fixture answers with
#[derive(Debug, Clone, Default)]
pub struct CogsFixture {
    pub revenue: Decimal,
    pub sales_cogs: Decimal,
    pub spoilage: SpoilageBreakdown,
    pub shortage: Decimal,
    pub surplus: Decimal,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, items: Vec<CatalogItem>) -> Self {
        self.catalog = items;
        self
    }

    pub fn with_batches(self, batches: Vec<Batch>) -> Self {
        *self.batches.lock().unwrap_or_else(|e| e.into_inner()) = batches;
        self
    }

    pub fn with_movements(mut self, movements: Vec<ProductMovementRecord>) -> Self {
        self.movements = movements;
        self
    }

    pub fn with_detail(mut self, detail: VarianceDetailRecord) -> Self {
        self.details.insert(detail.product_id, detail);
        self
    }

    pub fn with_sales(mut self, sales: Vec<SalesLine>) -> Self {
        self.sales = sales;
        self
    }

    pub fn with_expenses(mut self, expenses: Vec<ExpenseLine>) -> Self {
        self.expenses = expenses;
        self
    }

    pub fn with_cash_inputs(mut self, inputs: CashBasisInputs) -> Self {
        self.cash_inputs = inputs;
        self
    }

    pub fn with_cogs(mut self, cogs: CogsFixture) -> Self {
        self.cogs = cogs;
        self
    }

    fn lock_batches(&self) -> std::sync::MutexGuard<'_, Vec<Batch>> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AnalyticsDataSource for InMemoryDataSource {
    async fn get_catalog_items(&self) -> AppResult<Vec<CatalogItem>> {
        Ok(self.catalog.clone())
    }

    async fn get_active_batches(&self) -> AppResult<Vec<Batch>> {
        Ok(self
            .lock_batches()
            .iter()
            .filter(|b| !b.current_quantity.is_zero())
            .cloned()
            .collect())
    }

    async fn get_all_negative_batches(
        &self,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Batch>> {
        Ok(self
            .lock_batches()
            .iter()
            .filter(|b| b.is_negative())
            .filter(|b| as_of.map_or(true, |cutoff| b.event_date() <= cutoff))
            .cloned()
            .collect())
    }

    async fn get_batch(&self, batch_id: Uuid) -> AppResult<Option<Batch>> {
        Ok(self.lock_batches().iter().find(|b| b.id == batch_id).cloned())
    }

    async fn mark_batch_reconciled(
        &self,
        batch_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<Option<Batch>> {
        let mut batches = self.lock_batches();
        let Some(batch) = batches
            .iter_mut()
            .find(|b| b.id == batch_id && b.reconciled_at.is_none())
        else {
            return Ok(None);
        };
        batch.reconciled_at = Some(Utc::now());
        if let Some(notes) = notes {
            batch.notes = Some(notes.to_string());
        }
        batch.updated_at = Some(Utc::now());
        Ok(Some(batch.clone()))
    }

    async fn set_batch_quantity(
        &self,
        batch_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<Option<Batch>> {
        let mut batches = self.lock_batches();
        let Some(batch) = batches.iter_mut().find(|b| b.id == batch_id) else {
            return Ok(None);
        };
        batch.current_quantity = quantity;
        batch.updated_at = Some(Utc::now());
        Ok(Some(batch.clone()))
    }

    async fn get_cogs_by_date_range(
        &self,
        period: ReportPeriod,
        department: Option<Department>,
        excluded: Option<&ExcludedReasons>,
    ) -> AppResult<COGSBreakdown> {
        let total_cogs = self.cogs.sales_cogs + self.cogs.spoilage.total + self.cogs.shortage
            - self.cogs.surplus;
        Ok(COGSBreakdown {
            period,
            department,
            revenue: self.cogs.revenue,
            sales_cogs: self.cogs.sales_cogs,
            spoilage: self.cogs.spoilage,
            shortage: self.cogs.shortage,
            surplus: self.cogs.surplus,
            total_cogs,
            total_cogs_percent: ratio_percent(total_cogs, self.cogs.revenue),
            generated_at: Utc::now(),
            excluded_reasons: excluded.cloned().filter(|ex| !ex.is_empty()),
        })
    }

    async fn get_product_movements(
        &self,
        _period: ReportPeriod,
    ) -> AppResult<Vec<ProductMovementRecord>> {
        Ok(self.movements.clone())
    }

    async fn get_product_variance_detail(
        &self,
        product_id: Uuid,
        _period: ReportPeriod,
    ) -> AppResult<Option<VarianceDetailRecord>> {
        Ok(self.details.get(&product_id).cloned())
    }

    async fn get_sales_lines(&self, period: ReportPeriod) -> AppResult<Vec<SalesLine>> {
        Ok(self
            .sales
            .iter()
            .filter(|line| period.contains(line.sold_at.date_naive()))
            .cloned()
            .collect())
    }

    async fn get_expense_lines(&self, _period: ReportPeriod) -> AppResult<Vec<ExpenseLine>> {
        Ok(self.expenses.clone())
    }

    async fn get_cash_basis_inputs(&self, _period: ReportPeriod) -> AppResult<CashBasisInputs> {
        Ok(self.cash_inputs.clone())
    }
}
