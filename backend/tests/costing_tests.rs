//! Inventory valuation tests
//!
//! Tests for the batch-ledger valuation fold:
//! - Only positive-quantity batches carry value
//! - Unresolvable batches are skipped and counted
//! - Type, department and warehouse groupings
//! - Full value-descending item list with average unit costs

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use resto_backoffice_backend::services::costing::{
    average_cost_per_unit, build_valuation, total_batch_value,
};
use shared::models::{Batch, CatalogItem};
use shared::types::{Department, ItemType};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(name: &str, item_type: ItemType, department: Department) -> CatalogItem {
    CatalogItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        item_type,
        department,
        category: "general".to_string(),
        unit: "kg".to_string(),
    }
}

fn batch(item_id: Uuid, item_type: ItemType, quantity: &str, cost: &str) -> Batch {
    Batch {
        id: Uuid::new_v4(),
        item_id,
        item_type,
        batch_number: "B-001".to_string(),
        initial_quantity: dec(quantity),
        current_quantity: dec(quantity),
        unit: "kg".to_string(),
        cost_per_unit: dec(cost),
        warehouse_id: None,
        negative_reason: None,
        reconciled_at: None,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Batch value is quantity times FIFO unit cost
    #[test]
    fn test_total_value() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let batches = vec![
            batch(beef.id, ItemType::Product, "10", "120000"),
            batch(beef.id, ItemType::Product, "2.5", "118000"),
        ];
        let valuation = build_valuation(&[beef], &batches, Utc::now());

        // 10 * 120000 + 2.5 * 118000
        assert_eq!(valuation.total_value, dec("1495000"));
        assert_eq!(valuation.by_type.products.batch_count, 2);
        assert_eq!(valuation.by_type.products.item_count, 1);
    }

    /// Negative and zero batches never subtract from valuation
    #[test]
    fn test_negative_batches_excluded() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let batches = vec![
            batch(beef.id, ItemType::Product, "10", "100"),
            batch(beef.id, ItemType::Product, "-4", "100"),
            batch(beef.id, ItemType::Product, "0", "100"),
        ];
        let valuation = build_valuation(&[beef], &batches, Utc::now());

        assert_eq!(valuation.total_value, dec("1000"));
        assert_eq!(valuation.by_type.products.batch_count, 1);
    }

    /// Batches whose item no longer resolves are skipped and counted
    #[test]
    fn test_orphan_batches_skipped() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let batches = vec![
            batch(beef.id, ItemType::Product, "10", "100"),
            batch(Uuid::new_v4(), ItemType::Product, "5", "100"),
        ];
        let valuation = build_valuation(&[beef], &batches, Utc::now());

        assert_eq!(valuation.total_value, dec("1000"));
        assert_eq!(valuation.skipped_batches, 1);
    }

    /// Department buckets follow the catalog item's department
    #[test]
    fn test_department_buckets() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let rum = item("Rum", ItemType::Product, Department::Bar);
        let milk = item("Milk", ItemType::Product, Department::KitchenAndBar);
        let batches = vec![
            batch(beef.id, ItemType::Product, "1", "100"),
            batch(rum.id, ItemType::Product, "1", "200"),
            batch(milk.id, ItemType::Product, "1", "50"),
        ];
        let valuation = build_valuation(&[beef, rum, milk], &batches, Utc::now());

        assert_eq!(valuation.by_department.kitchen, dec("100"));
        assert_eq!(valuation.by_department.bar, dec("200"));
        assert_eq!(valuation.by_department.kitchen_and_bar, dec("50"));
    }

    /// Batches without a warehouse land in the "unknown" bucket
    #[test]
    fn test_warehouse_buckets() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let warehouse = Uuid::new_v4();
        let mut placed = batch(beef.id, ItemType::Product, "2", "100");
        placed.warehouse_id = Some(warehouse);
        let unplaced = batch(beef.id, ItemType::Product, "3", "100");
        let valuation = build_valuation(&[beef], &[placed, unplaced], Utc::now());

        assert_eq!(
            valuation.by_warehouse[&warehouse.to_string()].value,
            dec("200")
        );
        assert_eq!(valuation.by_warehouse["unknown"].value, dec("300"));
    }

    /// The item list is complete and value-descending
    #[test]
    fn test_items_full_and_sorted() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let rum = item("Rum", ItemType::Product, Department::Bar);
        let syrup = item("Syrup", ItemType::Preparation, Department::Bar);
        let batches = vec![
            batch(beef.id, ItemType::Product, "1", "100"),
            batch(rum.id, ItemType::Product, "1", "900"),
            batch(syrup.id, ItemType::Preparation, "1", "500"),
        ];
        let valuation = build_valuation(&[beef, rum, syrup], &batches, Utc::now());

        let names: Vec<&str> = valuation
            .top_items
            .iter()
            .map(|i| i.item_name.as_str())
            .collect();
        assert_eq!(names, vec!["Rum", "Syrup", "Beef"]);
        assert_eq!(valuation.by_type.preparations.item_count, 1);
    }

    /// Average unit cost is weighted by batch quantities
    #[test]
    fn test_weighted_average_cost() {
        let beef = item("Beef", ItemType::Product, Department::Kitchen);
        let batches = vec![
            batch(beef.id, ItemType::Product, "10", "20"),
            batch(beef.id, ItemType::Product, "5", "30"),
        ];
        let valuation = build_valuation(&[beef], &batches, Utc::now());

        // (10*20 + 5*30) / 15
        let avg = valuation.top_items[0].average_cost_per_unit;
        assert_eq!(avg.round_dp(2), dec("23.33"));
    }

    /// Zero quantity never divides
    #[test]
    fn test_average_cost_zero_quantity() {
        assert_eq!(average_cost_per_unit(Decimal::ZERO, dec("500")), Decimal::ZERO);
    }

    /// The proxy valuation ignores catalog resolution entirely
    #[test]
    fn test_total_batch_value_proxy() {
        let batches = vec![
            batch(Uuid::new_v4(), ItemType::Product, "10", "100"),
            batch(Uuid::new_v4(), ItemType::Product, "-5", "100"),
        ];
        assert_eq!(total_batch_value(&batches), dec("1000"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (-10_000i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn cost_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Total value equals the sum of the type buckets, and only
        /// positive batches contribute
        #[test]
        fn prop_valuation_consistency(
            specs in proptest::collection::vec((quantity_strategy(), cost_strategy()), 0..30),
        ) {
            let product = item("P", ItemType::Product, Department::Kitchen);
            let prep = item("S", ItemType::Preparation, Department::Bar);
            let batches: Vec<Batch> = specs
                .iter()
                .enumerate()
                .map(|(i, (q, c))| {
                    let (id, t) = if i % 2 == 0 {
                        (product.id, ItemType::Product)
                    } else {
                        (prep.id, ItemType::Preparation)
                    };
                    let mut b = batch(id, t, "0", "0");
                    b.current_quantity = *q;
                    b.cost_per_unit = *c;
                    b
                })
                .collect();

            let valuation = build_valuation(
                &[product, prep],
                &batches,
                Utc::now(),
            );

            let expected: Decimal = batches
                .iter()
                .filter(|b| b.current_quantity > Decimal::ZERO)
                .map(|b| b.current_quantity * b.cost_per_unit)
                .sum();

            prop_assert_eq!(valuation.total_value, expected);
            prop_assert_eq!(
                valuation.total_value,
                valuation.by_type.products.value + valuation.by_type.preparations.value
            );
            prop_assert!(valuation.total_value >= Decimal::ZERO);
        }

        /// The item list is always sorted by value descending
        #[test]
        fn prop_items_sorted(
            specs in proptest::collection::vec((1i64..=10_000i64, cost_strategy()), 0..20),
        ) {
            let catalog: Vec<CatalogItem> = specs
                .iter()
                .enumerate()
                .map(|(i, _)| item(&format!("P{}", i), ItemType::Product, Department::Kitchen))
                .collect();
            let batches: Vec<Batch> = specs
                .iter()
                .zip(&catalog)
                .map(|((q, c), it)| {
                    let mut b = batch(it.id, ItemType::Product, "0", "0");
                    b.current_quantity = Decimal::new(*q, 2);
                    b.cost_per_unit = *c;
                    b
                })
                .collect();

            let valuation = build_valuation(&catalog, &batches, Utc::now());

            for window in valuation.top_items.windows(2) {
                prop_assert!(window[0].total_value >= window[1].total_value);
            }
            prop_assert_eq!(valuation.top_items.len(), catalog.len());
        }
    }
}
