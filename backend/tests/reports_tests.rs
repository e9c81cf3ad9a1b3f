//! Report assembly tests
//!
//! Tests for the P&L statement, food-cost dashboard and CSV export:
//! - Revenue sectioning under both denominator policies
//! - Profit margins that stay finite at zero revenue
//! - Daily breakdown and full cost-descending item list
//! - Stable CSV column orders

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use resto_backoffice_backend::services::reports::{
    build_food_cost, build_opex, build_pl, inventory_adjustments, negative_inventory_csv,
    revenue_section, variance_report_csv,
};
use resto_backoffice_backend::services::variance::build_report;
use shared::models::{
    AccrualCogs, Batch, CashCogs, CatalogItem, COGSBreakdown, CogsCalculation,
    ConsolidatedMovement, ExpenseLine, ProductMovementRecord, SalesLine, SpoilageBreakdown,
};
use shared::types::{
    ratio_percent, CogsMethod, Department, ItemType, ReportPeriod, RevenueBasis, StockAmount,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn period() -> ReportPeriod {
    ReportPeriod::new(
        chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
    )
}

fn sale(
    name: &str,
    department: Department,
    day: u32,
    net: &str,
    gross: &str,
    cost: &str,
) -> SalesLine {
    SalesLine {
        menu_item_id: Uuid::new_v4(),
        menu_item_name: name.to_string(),
        variant_name: "default".to_string(),
        department,
        sold_at: Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap(),
        quantity: dec("1"),
        actual_revenue: dec(net),
        total_collected: dec(gross),
        total_cost: dec(cost),
    }
}

fn cogs_calc(total: &str) -> CogsCalculation {
    CogsCalculation {
        method: CogsMethod::Accrual,
        accrual: AccrualCogs {
            sales_cogs: dec(total),
            total: dec(total),
            ..Default::default()
        },
        cash: CashCogs::default(),
        total: dec(total),
    }
}

fn breakdown(sales: &str, spoilage: &str, shortage: &str, surplus: &str) -> COGSBreakdown {
    let total = dec(sales) + dec(spoilage) + dec(shortage) - dec(surplus);
    COGSBreakdown {
        period: period(),
        department: None,
        revenue: dec("1000"),
        sales_cogs: dec(sales),
        spoilage: SpoilageBreakdown {
            total: dec(spoilage),
            expired: dec(spoilage),
            spoiled: Decimal::ZERO,
            other: Decimal::ZERO,
        },
        shortage: dec(shortage),
        surplus: dec(surplus),
        total_cogs: total,
        total_cogs_percent: ratio_percent(total, dec("1000")),
        generated_at: Utc::now(),
        excluded_reasons: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Net basis uses actual revenue, gross basis the collected total
    #[test]
    fn test_revenue_basis() {
        let sales = vec![sale("Steak", Department::Kitchen, 5, "100", "118", "40")];

        let net = revenue_section(&sales, RevenueBasis::Net);
        assert_eq!(net.total, dec("100"));

        let gross = revenue_section(&sales, RevenueBasis::Gross);
        assert_eq!(gross.total, dec("118"));
    }

    /// Department revenue splits follow the sale's department
    #[test]
    fn test_revenue_departments() {
        let sales = vec![
            sale("Steak", Department::Kitchen, 5, "100", "118", "40"),
            sale("Mojito", Department::Bar, 5, "60", "70", "15"),
        ];
        let section = revenue_section(&sales, RevenueBasis::Net);

        assert_eq!(section.total, dec("160"));
        assert_eq!(section.by_department.kitchen, dec("100"));
        assert_eq!(section.by_department.bar, dec("60"));
    }

    /// OPEX groups expense lines by category
    #[test]
    fn test_opex_grouping() {
        let expenses = vec![
            ExpenseLine {
                category: "rent".to_string(),
                amount: dec("500"),
            },
            ExpenseLine {
                category: "utilities".to_string(),
                amount: dec("120"),
            },
            ExpenseLine {
                category: "rent".to_string(),
                amount: dec("50"),
            },
        ];
        let opex = build_opex(&expenses);

        assert_eq!(opex.total, dec("670"));
        assert_eq!(opex.by_category["rent"], dec("550"));
        assert_eq!(opex.by_category["utilities"], dec("120"));
    }

    /// Adjustments show positive losses and gains with a signed net
    #[test]
    fn test_inventory_adjustments() {
        let adjustments = inventory_adjustments(&breakdown("300", "40", "10", "5"));

        assert_eq!(adjustments.losses, dec("50"));
        assert_eq!(adjustments.gains, dec("5"));
        assert_eq!(adjustments.total, dec("-45"));
        assert_eq!(adjustments.by_category.spoilage, dec("40"));
        assert_eq!(adjustments.by_category.shortage, dec("10"));
        assert_eq!(adjustments.by_category.surplus, dec("5"));
    }

    /// Gross and net profit lines with margins
    #[test]
    fn test_pl_profit_lines() {
        let sales = vec![sale("Steak", Department::Kitchen, 5, "1000", "1180", "300")];
        let pl = build_pl(
            period(),
            revenue_section(&sales, RevenueBasis::Net),
            cogs_calc("300"),
            inventory_adjustments(&breakdown("300", "0", "0", "0")),
            build_opex(&[ExpenseLine {
                category: "rent".to_string(),
                amount: dec("200"),
            }]),
            Utc::now(),
        );

        assert_eq!(pl.gross_profit.amount, dec("700"));
        assert_eq!(pl.gross_profit.margin, dec("70"));
        assert_eq!(pl.net_profit.amount, dec("500"));
        assert_eq!(pl.net_profit.margin, dec("50"));
    }

    /// A period with no revenue yields zero margins, never a division error
    #[test]
    fn test_pl_zero_revenue() {
        let pl = build_pl(
            period(),
            revenue_section(&[], RevenueBasis::Net),
            cogs_calc("100"),
            inventory_adjustments(&breakdown("100", "0", "0", "0")),
            build_opex(&[]),
            Utc::now(),
        );

        assert_eq!(pl.gross_profit.amount, dec("-100"));
        assert_eq!(pl.gross_profit.margin, Decimal::ZERO);
        assert_eq!(pl.net_profit.margin, Decimal::ZERO);
    }

    /// The dashboard summary compares the actual ratio against the target
    #[test]
    fn test_food_cost_summary() {
        let sales = vec![
            sale("Steak", Department::Kitchen, 5, "100", "118", "40"),
            sale("Mojito", Department::Bar, 6, "100", "118", "20"),
        ];
        let dashboard = build_food_cost(period(), &sales, RevenueBasis::Net, dec("30"), Utc::now());

        assert_eq!(dashboard.summary.revenue, dec("200"));
        assert_eq!(dashboard.summary.food_cost, dec("60"));
        assert_eq!(dashboard.summary.food_cost_percentage, dec("30"));
        assert_eq!(dashboard.summary.variance, Decimal::ZERO);
    }

    /// Daily breakdown is date-ascending with per-day ratios
    #[test]
    fn test_food_cost_daily_breakdown() {
        let sales = vec![
            sale("B", Department::Kitchen, 10, "100", "100", "50"),
            sale("A", Department::Kitchen, 2, "200", "200", "40"),
        ];
        let dashboard = build_food_cost(period(), &sales, RevenueBasis::Net, dec("30"), Utc::now());

        assert_eq!(dashboard.daily_breakdown.len(), 2);
        assert!(dashboard.daily_breakdown[0].date < dashboard.daily_breakdown[1].date);
        assert_eq!(dashboard.daily_breakdown[0].food_cost_percentage, dec("20"));
        assert_eq!(dashboard.daily_breakdown[1].food_cost_percentage, dec("50"));
    }

    /// The item list is complete, aggregated per variant and cost-descending
    #[test]
    fn test_food_cost_items() {
        let steak_id = Uuid::new_v4();
        let mut first = sale("Steak", Department::Kitchen, 5, "100", "100", "40");
        first.menu_item_id = steak_id;
        let mut second = sale("Steak", Department::Kitchen, 6, "100", "100", "40");
        second.menu_item_id = steak_id;
        let cheap = sale("Salad", Department::Kitchen, 6, "50", "50", "10");

        let dashboard = build_food_cost(
            period(),
            &[first, second, cheap],
            RevenueBasis::Net,
            dec("30"),
            Utc::now(),
        );

        assert_eq!(dashboard.top_items_by_cost.len(), 2);
        assert_eq!(dashboard.top_items_by_cost[0].menu_item_name, "Steak");
        assert_eq!(dashboard.top_items_by_cost[0].total_cost, dec("80"));
        assert_eq!(dashboard.top_items_by_cost[0].quantity_sold, dec("2"));
        assert_eq!(dashboard.top_items_by_cost[1].menu_item_name, "Salad");
    }

    /// Variance CSV keeps its spreadsheet column order
    #[test]
    fn test_variance_csv_columns() {
        let record = ProductMovementRecord {
            product_id: Uuid::new_v4(),
            product_name: "Beef".to_string(),
            product_code: Some("BF-1".to_string()),
            unit: "kg".to_string(),
            department: Department::Kitchen,
            movement: ConsolidatedMovement {
                opening: StockAmount::new(dec("10"), dec("100")),
                closing: StockAmount::new(dec("9"), dec("90")),
                ..Default::default()
            },
            traced_sales: StockAmount::default(),
            traced_loss: StockAmount::default(),
        };
        let report = build_report(period(), &[record], None, Utc::now());
        let csv = variance_report_csv(&report).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Product,Code,Unit,Department,Opening Qty,Opening Amount,\
             Received Qty,Received Amount,Sales W/O Qty,Sales W/O Amount,\
             Prep W/O Qty,Prep W/O Amount,Loss W/O Qty,Loss W/O Amount,\
             Closing Qty,Closing Amount,Variance Qty,Variance Amount"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Beef,BF-1,kg,kitchen,10,100,"));
        assert_eq!(lines.next(), None);
    }

    /// Negative-inventory CSV keeps its column order and row count
    #[test]
    fn test_negative_inventory_csv() {
        use resto_backoffice_backend::services::negative_inventory::build_report as build_negative;

        let tomato = CatalogItem {
            id: Uuid::new_v4(),
            name: "Tomato".to_string(),
            item_type: ItemType::Product,
            department: Department::Kitchen,
            category: "vegetables".to_string(),
            unit: "kg".to_string(),
        };
        let batch = Batch {
            id: Uuid::new_v4(),
            item_id: tomato.id,
            item_type: ItemType::Product,
            batch_number: "B-42".to_string(),
            initial_quantity: dec("10"),
            current_quantity: dec("-2"),
            unit: "kg".to_string(),
            cost_per_unit: dec("15000"),
            warehouse_id: None,
            negative_reason: Some("sales_consumption".to_string()),
            reconciled_at: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap(),
            updated_at: Some(Utc.with_ymd_and_hms(2025, 6, 12, 9, 30, 0).unwrap()),
        };
        let report = build_negative(period(), &[tomato], &[batch], Utc::now());
        let csv = negative_inventory_csv(&report).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Item Name,Item Type,Category,Department,Batch Number,Event Date,\
             Negative Quantity,Unit,Cost Per Unit,Total Cost,Status,Reason"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Tomato,product,vegetables,kitchen,B-42,2025-06-12 09:30,2,"));
        assert!(row.ends_with("unreconciled,sales_consumption"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn sales_strategy() -> impl Strategy<Value = Vec<SalesLine>> {
        proptest::collection::vec(
            (money_strategy(), money_strategy(), 1u32..=28u32).prop_map(|(net, cost, day)| {
                sale("Item", Department::Kitchen, day, &net.to_string(), &net.to_string(), &cost.to_string())
            }),
            0..20,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Daily figures always sum back to the dashboard totals
        #[test]
        fn prop_daily_sums_to_summary(sales in sales_strategy()) {
            let dashboard =
                build_food_cost(period(), &sales, RevenueBasis::Net, dec("30"), Utc::now());

            let daily_revenue: Decimal =
                dashboard.daily_breakdown.iter().map(|d| d.revenue).sum();
            let daily_cost: Decimal =
                dashboard.daily_breakdown.iter().map(|d| d.food_cost).sum();
            prop_assert_eq!(daily_revenue, dashboard.summary.revenue);
            prop_assert_eq!(daily_cost, dashboard.summary.food_cost);

            let item_cost: Decimal =
                dashboard.top_items_by_cost.iter().map(|i| i.total_cost).sum();
            prop_assert_eq!(item_cost, dashboard.summary.food_cost);
        }

        /// Net profit is always gross minus OPEX
        #[test]
        fn prop_net_is_gross_minus_opex(
            revenue in money_strategy(),
            cogs_total in money_strategy(),
            opex_amount in money_strategy(),
        ) {
            let sales = vec![sale(
                "Item",
                Department::Kitchen,
                5,
                &revenue.to_string(),
                &revenue.to_string(),
                "0",
            )];
            let pl = build_pl(
                period(),
                revenue_section(&sales, RevenueBasis::Net),
                cogs_calc(&cogs_total.to_string()),
                inventory_adjustments(&breakdown("0", "0", "0", "0")),
                build_opex(&[ExpenseLine {
                    category: "misc".to_string(),
                    amount: opex_amount,
                }]),
                Utc::now(),
            );
            prop_assert_eq!(pl.net_profit.amount, pl.gross_profit.amount - opex_amount);
        }

        /// CSV row count is always header plus one row per item
        #[test]
        fn prop_csv_row_count(n in 0usize..15) {
            let records: Vec<ProductMovementRecord> = (0..n)
                .map(|i| ProductMovementRecord {
                    product_id: Uuid::new_v4(),
                    product_name: format!("P{}", i),
                    product_code: None,
                    unit: "kg".to_string(),
                    department: Department::Kitchen,
                    movement: ConsolidatedMovement::default(),
                    traced_sales: StockAmount::default(),
                    traced_loss: StockAmount::default(),
                })
                .collect();
            let report = build_report(period(), &records, None, Utc::now());
            let csv = variance_report_csv(&report).unwrap();
            prop_assert_eq!(csv.lines().count(), n + 1);
        }
    }
}
