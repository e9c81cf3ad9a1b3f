//! Inventory valuation over the batch ledger
//!
//! Valuation is a pure fold over the current batch set: only batches with
//! positive remaining quantity carry value, negative batches are a
//! reconciliation concern and never subtract from the valuation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{Batch, CatalogItem, InventoryValuation, ValuedItem, WarehouseValuation};
use shared::types::{Department, ItemType};

use crate::datasource::AnalyticsDataSource;
use crate::error::AppResult;

/// Average cost per unit, 0 for zero quantity
pub fn average_cost_per_unit(quantity: Decimal, value: Decimal) -> Decimal {
    if quantity.is_zero() {
        Decimal::ZERO
    } else {
        value / quantity
    }
}

/// Fold the active batch set into a valuation snapshot
pub fn build_valuation(
    catalog: &[CatalogItem],
    batches: &[Batch],
    calculated_at: DateTime<Utc>,
) -> InventoryValuation {
    let items_by_id: HashMap<Uuid, &CatalogItem> =
        catalog.iter().map(|item| (item.id, item)).collect();

    let mut valuation = InventoryValuation {
        calculated_at,
        total_value: Decimal::ZERO,
        by_type: Default::default(),
        by_department: Default::default(),
        by_warehouse: BTreeMap::new(),
        top_items: Vec::new(),
        skipped_batches: 0,
    };

    struct ItemAccumulator<'a> {
        item: &'a CatalogItem,
        quantity: Decimal,
        value: Decimal,
    }

    let mut per_item: HashMap<Uuid, ItemAccumulator> = HashMap::new();

    for batch in batches {
        if batch.current_quantity <= Decimal::ZERO {
            continue;
        }
        let Some(item) = items_by_id.get(&batch.item_id).copied() else {
            valuation.skipped_batches += 1;
            continue;
        };

        let value = batch.value();
        valuation.total_value += value;

        let type_bucket = match item.item_type {
            ItemType::Product => &mut valuation.by_type.products,
            ItemType::Preparation => &mut valuation.by_type.preparations,
        };
        type_bucket.value += value;
        type_bucket.batch_count += 1;

        match item.department {
            Department::Kitchen => valuation.by_department.kitchen += value,
            Department::Bar => valuation.by_department.bar += value,
            Department::KitchenAndBar => valuation.by_department.kitchen_and_bar += value,
            Department::Unknown => {}
        }

        let warehouse_key = batch
            .warehouse_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let warehouse = valuation
            .by_warehouse
            .entry(warehouse_key)
            .or_insert_with(WarehouseValuation::default);
        warehouse.value += value;
        warehouse.batch_count += 1;

        let acc = per_item.entry(item.id).or_insert_with(|| ItemAccumulator {
            item,
            quantity: Decimal::ZERO,
            value: Decimal::ZERO,
        });
        acc.quantity += batch.current_quantity;
        acc.value += value;
    }

    valuation.by_type.products.item_count = per_item
        .values()
        .filter(|acc| acc.item.item_type == ItemType::Product)
        .count() as i64;
    valuation.by_type.preparations.item_count = per_item
        .values()
        .filter(|acc| acc.item.item_type == ItemType::Preparation)
        .count() as i64;

    let mut top_items: Vec<ValuedItem> = per_item
        .into_values()
        .map(|acc| ValuedItem {
            item_id: acc.item.id,
            item_name: acc.item.name.clone(),
            item_type: acc.item.item_type,
            department: acc.item.department,
            quantity: acc.quantity,
            unit: acc.item.unit.clone(),
            average_cost_per_unit: average_cost_per_unit(acc.quantity, acc.value),
            total_value: acc.value,
        })
        .collect();
    // Full list, value-descending; ties broken by name for stable output
    top_items.sort_by(|a, b| {
        b.total_value
            .cmp(&a.total_value)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    valuation.top_items = top_items;

    valuation
}

/// Total value of positive-quantity batches, ignoring catalog resolution.
/// Used as the proxy inventory endpoint for the cash COGS basis.
pub fn total_batch_value(batches: &[Batch]) -> Decimal {
    batches
        .iter()
        .filter(|b| b.current_quantity > Decimal::ZERO)
        .map(Batch::value)
        .sum()
}

/// Inventory valuation service
#[derive(Clone)]
pub struct CostingService {
    source: Arc<dyn AnalyticsDataSource>,
}

impl CostingService {
    pub fn new(source: Arc<dyn AnalyticsDataSource>) -> Self {
        Self { source }
    }

    /// Current inventory valuation snapshot
    pub async fn inventory_valuation(&self) -> AppResult<InventoryValuation> {
        let catalog = self.source.get_catalog_items().await?;
        let batches = self.source.get_active_batches().await?;
        let valuation = build_valuation(&catalog, &batches, Utc::now());
        if valuation.skipped_batches > 0 {
            tracing::warn!(
                skipped = valuation.skipped_batches,
                "batches referencing unknown catalog items were excluded from the valuation"
            );
        }
        Ok(valuation)
    }
}
