//! PostgreSQL-backed data source
//!
//! Row-level reads map straight onto tables; the heavy period aggregates
//! (COGS, consolidated movements) live in SQL functions so the database
//! does the summing close to the data.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{
    Batch, CashBasisInputs, CatalogItem, COGSBreakdown, ExcludedReasons, ExpenseLine,
    ConsolidatedMovement, LossBreakdownItem, LossReason, PreparationBreakdown,
    ProductMovementRecord, ReceiptEntry, SalesLine, SpoilageBreakdown, VarianceDetailRecord,
};
use shared::types::{Department, ItemType, ReportPeriod, StockAmount};

use crate::datasource::{with_timeout, AnalyticsDataSource};
use crate::error::AppResult;

/// Production data source over a PostgreSQL pool
#[derive(Clone)]
pub struct PgDataSource {
    db: PgPool,
}

impl PgDataSource {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn parse_department(value: &str) -> Department {
    match value {
        "kitchen" => Department::Kitchen,
        "bar" => Department::Bar,
        "kitchen_and_bar" => Department::KitchenAndBar,
        _ => Department::Unknown,
    }
}

fn parse_item_type(value: &str) -> ItemType {
    match value {
        "preparation" => ItemType::Preparation,
        _ => ItemType::Product,
    }
}

fn parse_loss_reason(value: &str) -> LossReason {
    match value {
        "expired" => LossReason::Expired,
        "spoiled" => LossReason::Spoiled,
        _ => LossReason::Other,
    }
}

#[derive(Debug, FromRow)]
struct CatalogItemRow {
    id: Uuid,
    name: String,
    item_type: String,
    department: String,
    category: String,
    unit: String,
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(row: CatalogItemRow) -> Self {
        CatalogItem {
            id: row.id,
            name: row.name,
            item_type: parse_item_type(&row.item_type),
            department: parse_department(&row.department),
            category: row.category,
            unit: row.unit,
        }
    }
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    item_id: Uuid,
    item_type: String,
    batch_number: String,
    initial_quantity: Decimal,
    current_quantity: Decimal,
    unit: String,
    cost_per_unit: Decimal,
    warehouse_id: Option<Uuid>,
    negative_reason: Option<String>,
    reconciled_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Batch {
            id: row.id,
            item_id: row.item_id,
            item_type: parse_item_type(&row.item_type),
            batch_number: row.batch_number,
            initial_quantity: row.initial_quantity,
            current_quantity: row.current_quantity,
            unit: row.unit,
            cost_per_unit: row.cost_per_unit,
            warehouse_id: row.warehouse_id,
            negative_reason: row.negative_reason,
            reconciled_at: row.reconciled_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BATCH_COLUMNS: &str = "id, item_id, item_type, batch_number, initial_quantity, \
     current_quantity, unit, cost_per_unit, warehouse_id, negative_reason, \
     reconciled_at, notes, created_at, updated_at";

#[derive(Debug, FromRow)]
struct CogsRow {
    revenue: Decimal,
    sales_cogs: Decimal,
    spoilage_total: Decimal,
    spoilage_expired: Decimal,
    spoilage_spoiled: Decimal,
    spoilage_other: Decimal,
    shortage: Decimal,
    surplus: Decimal,
}

#[derive(Debug, FromRow)]
struct MovementRow {
    product_id: Uuid,
    product_name: String,
    product_code: Option<String>,
    unit: String,
    department: String,
    opening_qty: Decimal,
    opening_amount: Decimal,
    received_qty: Decimal,
    received_amount: Decimal,
    sales_qty: Decimal,
    sales_amount: Decimal,
    writeoff_qty: Decimal,
    writeoff_amount: Decimal,
    loss_qty: Decimal,
    loss_amount: Decimal,
    gain_qty: Decimal,
    gain_amount: Decimal,
    closing_qty: Decimal,
    closing_amount: Decimal,
    in_prep_qty: Decimal,
    in_prep_amount: Decimal,
    traced_sales_qty: Decimal,
    traced_sales_amount: Decimal,
    traced_loss_qty: Decimal,
    traced_loss_amount: Decimal,
}

impl From<MovementRow> for ProductMovementRecord {
    fn from(row: MovementRow) -> Self {
        ProductMovementRecord {
            product_id: row.product_id,
            product_name: row.product_name,
            product_code: row.product_code,
            unit: row.unit,
            department: parse_department(&row.department),
            movement: ConsolidatedMovement {
                opening: StockAmount::new(row.opening_qty, row.opening_amount),
                received: StockAmount::new(row.received_qty, row.received_amount),
                sales: StockAmount::new(row.sales_qty, row.sales_amount),
                writeoffs: StockAmount::new(row.writeoff_qty, row.writeoff_amount),
                loss: StockAmount::new(row.loss_qty, row.loss_amount),
                gain: StockAmount::new(row.gain_qty, row.gain_amount),
                closing: StockAmount::new(row.closing_qty, row.closing_amount),
                in_preparations: StockAmount::new(row.in_prep_qty, row.in_prep_amount),
            },
            traced_sales: StockAmount::new(row.traced_sales_qty, row.traced_sales_amount),
            traced_loss: StockAmount::new(row.traced_loss_qty, row.traced_loss_amount),
        }
    }
}

#[derive(Debug, FromRow)]
struct SalesLineRow {
    menu_item_id: Uuid,
    menu_item_name: String,
    variant_name: String,
    department: String,
    sold_at: DateTime<Utc>,
    quantity: Decimal,
    actual_revenue: Decimal,
    total_collected: Decimal,
    total_cost: Decimal,
}

#[derive(Debug, FromRow)]
struct ReceiptRow {
    receipt_date: NaiveDate,
    quantity: Decimal,
    amount: Decimal,
    supplier_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct ExpenseRow {
    category: String,
    amount: Decimal,
}

#[derive(Debug, FromRow)]
struct LossReasonRow {
    reason: String,
    quantity: Decimal,
    amount: Decimal,
}

#[derive(Debug, FromRow)]
struct PreparationRow {
    preparation_id: Uuid,
    preparation_name: String,
    production_qty: Decimal,
    production_amount: Decimal,
    traced_sales_qty: Decimal,
    traced_sales_amount: Decimal,
    traced_loss_qty: Decimal,
    traced_loss_amount: Decimal,
}

#[derive(Debug, FromRow)]
struct DetailHeaderRow {
    product_id: Uuid,
    product_name: String,
    product_code: Option<String>,
    unit: String,
    department: String,
    direct_sales_qty: Decimal,
    direct_sales_amount: Decimal,
    direct_loss_qty: Decimal,
    direct_loss_amount: Decimal,
    production_qty: Decimal,
    production_amount: Decimal,
}

#[async_trait]
impl AnalyticsDataSource for PgDataSource {
    async fn get_catalog_items(&self) -> AppResult<Vec<CatalogItem>> {
        let rows = with_timeout(
            "catalog_items",
            sqlx::query_as::<_, CatalogItemRow>(
                r#"
                SELECT id, name, item_type, department, category, unit
                FROM catalog_items
                WHERE deleted_at IS NULL
                ORDER BY name
                "#,
            )
            .fetch_all(&self.db),
        )
        .await?;

        Ok(rows.into_iter().map(CatalogItem::from).collect())
    }

    async fn get_active_batches(&self) -> AppResult<Vec<Batch>> {
        let rows = with_timeout(
            "active_batches",
            sqlx::query_as::<_, BatchRow>(&format!(
                "SELECT {BATCH_COLUMNS} FROM storage_batches WHERE current_quantity <> 0"
            ))
            .fetch_all(&self.db),
        )
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }

    async fn get_all_negative_batches(
        &self,
        as_of: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Batch>> {
        let rows = with_timeout(
            "negative_batches",
            sqlx::query_as::<_, BatchRow>(&format!(
                r#"
                SELECT {BATCH_COLUMNS}
                FROM storage_batches
                WHERE current_quantity < 0
                  AND COALESCE(updated_at, created_at) <= COALESCE($1, NOW())
                ORDER BY COALESCE(updated_at, created_at) DESC
                "#
            ))
            .bind(as_of)
            .fetch_all(&self.db),
        )
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }

    async fn get_batch(&self, batch_id: Uuid) -> AppResult<Option<Batch>> {
        let row = with_timeout(
            "batch_by_id",
            sqlx::query_as::<_, BatchRow>(&format!(
                "SELECT {BATCH_COLUMNS} FROM storage_batches WHERE id = $1"
            ))
            .bind(batch_id)
            .fetch_optional(&self.db),
        )
        .await?;

        Ok(row.map(Batch::from))
    }

    async fn mark_batch_reconciled(
        &self,
        batch_id: Uuid,
        notes: Option<&str>,
    ) -> AppResult<Option<Batch>> {
        // Keyed update: only one concurrent caller observes a row here,
        // everyone else gets None and resolves the outcome via get_batch.
        let row = with_timeout(
            "mark_batch_reconciled",
            sqlx::query_as::<_, BatchRow>(&format!(
                r#"
                UPDATE storage_batches
                SET reconciled_at = NOW(),
                    notes = COALESCE($2, notes),
                    updated_at = NOW()
                WHERE id = $1 AND reconciled_at IS NULL
                RETURNING {BATCH_COLUMNS}
                "#
            ))
            .bind(batch_id)
            .bind(notes)
            .fetch_optional(&self.db),
        )
        .await?;

        Ok(row.map(Batch::from))
    }

    async fn set_batch_quantity(
        &self,
        batch_id: Uuid,
        quantity: Decimal,
    ) -> AppResult<Option<Batch>> {
        let row = with_timeout(
            "set_batch_quantity",
            sqlx::query_as::<_, BatchRow>(&format!(
                r#"
                UPDATE storage_batches
                SET current_quantity = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING {BATCH_COLUMNS}
                "#
            ))
            .bind(batch_id)
            .bind(quantity)
            .fetch_optional(&self.db),
        )
        .await?;

        Ok(row.map(Batch::from))
    }

    async fn get_cogs_by_date_range(
        &self,
        period: ReportPeriod,
        department: Option<Department>,
        excluded: Option<&ExcludedReasons>,
    ) -> AppResult<COGSBreakdown> {
        let (storage_excluded, prep_excluded) = match excluded {
            Some(ex) => (ex.storage.clone(), ex.preparation.clone()),
            None => (Vec::new(), Vec::new()),
        };

        let row = with_timeout(
            "cogs_breakdown",
            sqlx::query_as::<_, CogsRow>(
                "SELECT * FROM get_cogs_breakdown($1, $2, $3, $4, $5)",
            )
            .bind(period.date_from)
            .bind(period.date_to)
            .bind(department.map(|d| d.as_str()))
            .bind(&storage_excluded)
            .bind(&prep_excluded)
            .fetch_one(&self.db),
        )
        .await?;

        let spoilage = SpoilageBreakdown {
            total: row.spoilage_total,
            expired: row.spoilage_expired,
            spoiled: row.spoilage_spoiled,
            other: row.spoilage_other,
        };
        let total_cogs = row.sales_cogs + spoilage.total + row.shortage - row.surplus;

        Ok(COGSBreakdown {
            period,
            department,
            revenue: row.revenue,
            sales_cogs: row.sales_cogs,
            spoilage,
            shortage: row.shortage,
            surplus: row.surplus,
            total_cogs,
            total_cogs_percent: shared::types::ratio_percent(total_cogs, row.revenue),
            generated_at: Utc::now(),
            excluded_reasons: excluded.cloned().filter(|ex| !ex.is_empty()),
        })
    }

    async fn get_product_movements(
        &self,
        period: ReportPeriod,
    ) -> AppResult<Vec<ProductMovementRecord>> {
        let rows = with_timeout(
            "product_movements",
            sqlx::query_as::<_, MovementRow>("SELECT * FROM get_product_movements($1, $2)")
                .bind(period.date_from)
                .bind(period.date_to)
                .fetch_all(&self.db),
        )
        .await?;

        Ok(rows.into_iter().map(ProductMovementRecord::from).collect())
    }

    async fn get_product_variance_detail(
        &self,
        product_id: Uuid,
        period: ReportPeriod,
    ) -> AppResult<Option<VarianceDetailRecord>> {
        let header = with_timeout(
            "variance_detail_header",
            sqlx::query_as::<_, DetailHeaderRow>(
                "SELECT * FROM get_product_variance_header($1, $2, $3)",
            )
            .bind(product_id)
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_optional(&self.db),
        )
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let receipts = with_timeout(
            "variance_detail_receipts",
            sqlx::query_as::<_, ReceiptRow>(
                r#"
                SELECT r.receipt_date, ri.quantity, ri.quantity * ri.cost_per_unit AS amount,
                       s.name AS supplier_name
                FROM receipt_items ri
                JOIN receipts r ON r.id = ri.receipt_id
                LEFT JOIN suppliers s ON s.id = r.supplier_id
                WHERE ri.item_id = $1 AND r.receipt_date BETWEEN $2 AND $3
                ORDER BY r.receipt_date
                "#,
            )
            .bind(product_id)
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_all(&self.db),
        )
        .await?;

        let losses = with_timeout(
            "variance_detail_losses",
            sqlx::query_as::<_, LossReasonRow>(
                r#"
                SELECT reason, SUM(quantity) AS quantity, SUM(amount) AS amount
                FROM storage_writeoffs
                WHERE item_id = $1 AND operation_date BETWEEN $2 AND $3
                  AND kind = 'loss'
                GROUP BY reason
                ORDER BY reason
                "#,
            )
            .bind(product_id)
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_all(&self.db),
        )
        .await?;

        let preparations = with_timeout(
            "variance_detail_preparations",
            sqlx::query_as::<_, PreparationRow>(
                "SELECT * FROM get_preparation_breakdown($1, $2, $3)",
            )
            .bind(product_id)
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_all(&self.db),
        )
        .await?;

        Ok(Some(VarianceDetailRecord {
            product_id: header.product_id,
            product_name: header.product_name,
            product_code: header.product_code,
            unit: header.unit,
            department: parse_department(&header.department),
            receipts: receipts
                .into_iter()
                .map(|r| ReceiptEntry {
                    receipt_date: r.receipt_date,
                    quantity: r.quantity,
                    amount: r.amount,
                    supplier_name: r.supplier_name,
                })
                .collect(),
            direct_sales: StockAmount::new(header.direct_sales_qty, header.direct_sales_amount),
            direct_loss: StockAmount::new(header.direct_loss_qty, header.direct_loss_amount),
            production: StockAmount::new(header.production_qty, header.production_amount),
            loss_by_reason: losses
                .into_iter()
                .map(|l| LossBreakdownItem {
                    reason: parse_loss_reason(&l.reason),
                    quantity: l.quantity,
                    amount: l.amount,
                })
                .collect(),
            preparations: preparations
                .into_iter()
                .map(|p| PreparationBreakdown {
                    preparation_id: p.preparation_id,
                    preparation_name: p.preparation_name,
                    production: StockAmount::new(p.production_qty, p.production_amount),
                    traced_sales: StockAmount::new(p.traced_sales_qty, p.traced_sales_amount),
                    traced_loss: StockAmount::new(p.traced_loss_qty, p.traced_loss_amount),
                })
                .collect(),
        }))
    }

    async fn get_sales_lines(&self, period: ReportPeriod) -> AppResult<Vec<SalesLine>> {
        let rows = with_timeout(
            "sales_lines",
            sqlx::query_as::<_, SalesLineRow>(
                r#"
                SELECT menu_item_id, menu_item_name, variant_name, department, sold_at,
                       quantity, actual_revenue, total_collected, total_cost
                FROM sales_lines
                WHERE sold_at::date BETWEEN $1 AND $2
                  AND status = 'completed'
                ORDER BY sold_at
                "#,
            )
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_all(&self.db),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SalesLine {
                menu_item_id: r.menu_item_id,
                menu_item_name: r.menu_item_name,
                variant_name: r.variant_name,
                department: parse_department(&r.department),
                sold_at: r.sold_at,
                quantity: r.quantity,
                actual_revenue: r.actual_revenue,
                total_collected: r.total_collected,
                total_cost: r.total_cost,
            })
            .collect())
    }

    async fn get_expense_lines(&self, period: ReportPeriod) -> AppResult<Vec<ExpenseLine>> {
        let rows = with_timeout(
            "expense_lines",
            sqlx::query_as::<_, ExpenseRow>(
                r#"
                SELECT category, SUM(amount) AS amount
                FROM expenses
                WHERE expense_date BETWEEN $1 AND $2
                GROUP BY category
                ORDER BY category
                "#,
            )
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_all(&self.db),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ExpenseLine {
                category: r.category,
                amount: r.amount,
            })
            .collect())
    }

    async fn get_cash_basis_inputs(&self, period: ReportPeriod) -> AppResult<CashBasisInputs> {
        let purchases = with_timeout(
            "supplier_payments",
            sqlx::query_scalar::<_, Decimal>(
                r#"
                SELECT COALESCE(SUM(amount), 0)
                FROM supplier_payments
                WHERE payment_date BETWEEN $1 AND $2
                "#,
            )
            .bind(period.date_from)
            .bind(period.date_to)
            .fetch_one(&self.db),
        )
        .await?;

        let opening_ap = with_timeout(
            "opening_accounts_payable",
            sqlx::query_scalar::<_, Decimal>(
                "SELECT COALESCE(SUM(balance), 0) FROM accounts_payable_as_of($1)",
            )
            .bind(period.date_from)
            .fetch_one(&self.db),
        )
        .await?;

        let closing_ap = with_timeout(
            "closing_accounts_payable",
            sqlx::query_scalar::<_, Decimal>(
                "SELECT COALESCE(SUM(balance), 0) FROM accounts_payable_as_of($1 + 1)",
            )
            .bind(period.date_to)
            .fetch_one(&self.db),
        )
        .await?;

        // Point-in-time valuations exist only where snapshots were taken;
        // absent rows make the aggregator fall back to the proxy valuation.
        let opening_inventory = with_timeout(
            "opening_inventory_snapshot",
            sqlx::query_scalar::<_, Decimal>(
                "SELECT total_value FROM inventory_snapshots WHERE snapshot_date = $1",
            )
            .bind(period.date_from)
            .fetch_optional(&self.db),
        )
        .await?;

        let closing_inventory = with_timeout(
            "closing_inventory_snapshot",
            sqlx::query_scalar::<_, Decimal>(
                "SELECT total_value FROM inventory_snapshots WHERE snapshot_date = $1",
            )
            .bind(period.date_to)
            .fetch_optional(&self.db),
        )
        .await?;

        Ok(CashBasisInputs {
            purchases,
            opening_accounts_payable: opening_ap,
            closing_accounts_payable: closing_ap,
            opening_inventory,
            closing_inventory,
        })
    }
}
