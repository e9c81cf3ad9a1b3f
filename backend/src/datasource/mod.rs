//! Data source abstraction for the reporting engine
//!
//! Report assemblers and reconciliation services never talk to storage
//! directly; they receive an [`AnalyticsDataSource`] at construction. The
//! production implementation runs sqlx queries against PostgreSQL; tests use
//! the in-memory fixture.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{
    Batch, CashBasisInputs, CatalogItem, COGSBreakdown, ExcludedReasons, ExpenseLine,
    ProductMovementRecord, SalesLine, VarianceDetailRecord,
};
use shared::types::{Department, ReportPeriod};

use crate::error::{AppError, AppResult};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDataSource;
pub use postgres::PgDataSource;

/// Upper bound on any single store call. A slow store must surface as a
/// retryable error, never as a hung report request.
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything the reporting engine needs to know about the outside world
#[async_trait]
pub trait AnalyticsDataSource: Send + Sync {
    /// Catalog snapshot of all products and preparations
    async fn get_catalog_items(&self) -> AppResult<Vec<CatalogItem>>;

    /// All batches with nonzero remaining quantity
    async fn get_active_batches(&self) -> AppResult<Vec<Batch>>;

    /// All batches currently negative, regardless of reconciliation state.
    /// `as_of` bounds the event date from above when given.
    async fn get_all_negative_batches(
        &self,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Batch>>;

    /// Single batch lookup
    async fn get_batch(&self, batch_id: Uuid) -> AppResult<Option<Batch>>;

    /// Atomically stamp `reconciled_at` on a not-yet-reconciled batch.
    /// Returns the updated batch, or `None` when the batch does not exist
    /// or was already reconciled (the caller distinguishes the two with
    /// [`get_batch`](Self::get_batch)).
    async fn mark_batch_reconciled(
        &self,
        batch_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<Option<Batch>>;

    /// Set a batch's current quantity to an absolute value
    async fn set_batch_quantity(&self, batch_id: Uuid, quantity: Decimal)
        -> AppResult<Option<Batch>>;

    /// Aggregate COGS breakdown for a period, optionally restricted to one
    /// department and excluding configured write-off reasons
    async fn get_cogs_by_date_range(
        &self,
        period: ReportPeriod,
        department: Option<Department>,
        excluded: Option<&ExcludedReasons>,
    ) -> AppResult<COGSBreakdown>;

    /// Consolidated per-product stock movements for a period
    async fn get_product_movements(
        &self,
        period: ReportPeriod,
    ) -> AppResult<Vec<ProductMovementRecord>>;

    /// Drill-down movement detail for one product
    async fn get_product_variance_detail(
        &self,
        product_id: Uuid,
        period: ReportPeriod,
    ) -> AppResult<Option<VarianceDetailRecord>>;

    /// Sold menu item lines for a period
    async fn get_sales_lines(&self, period: ReportPeriod) -> AppResult<Vec<SalesLine>>;

    /// Operating expense lines for a period
    async fn get_expense_lines(&self, period: ReportPeriod) -> AppResult<Vec<ExpenseLine>>;

    /// Raw cash-basis inputs (purchases, accounts payable, inventory
    /// snapshots when the store supports them)
    async fn get_cash_basis_inputs(&self, period: ReportPeriod) -> AppResult<CashBasisInputs>;
}

/// Run a store future under [`STORE_TIMEOUT`], mapping failures to the two
/// retryable error variants
pub(crate) async fn with_timeout<T, F>(query: &'static str, fut: F) -> AppResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(STORE_TIMEOUT, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(AppError::DataUnavailable { query, source }),
        Err(_) => Err(AppError::QueryTimeout { query }),
    }
}
