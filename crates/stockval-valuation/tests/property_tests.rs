//! Property-based tests for LIFO valuation.
//!
//! Run with: cargo test -p stockval-valuation --test `property_tests`

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use stockval_core::{Ledger, OpeningStock, PurchaseEvent, SaleEvent};
use stockval_valuation::{valuate, valuate_ledger, MarginPolicy, Statement};

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..5_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..730).prop_map(|offset| NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Days::new(offset))
}

fn arb_purchase() -> impl Strategy<Value = PurchaseEvent> {
    (arb_date(), 1u64..200, arb_amount())
        .prop_map(|(date, quantity, cost)| PurchaseEvent::new(date, quantity, cost))
}

fn arb_sale() -> impl Strategy<Value = SaleEvent> {
    (arb_date(), 1u64..200, prop::option::of(arb_amount())).prop_map(|(date, quantity, price)| {
        let sale = SaleEvent::new(date, quantity);
        match price {
            Some(price) => sale.with_unit_price(price),
            None => sale,
        }
    })
}

fn arb_opening() -> impl Strategy<Value = Option<OpeningStock>> {
    prop::option::of((0u64..300, arb_amount()).prop_map(|(q, c)| OpeningStock::new(q, c)))
}

// ============================================================================
// Conservation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Opening + purchased units equal sold + remaining units, and the same
    /// holds for book value.
    #[test]
    fn prop_quantity_and_value_conserved(
        purchases in prop::collection::vec(arb_purchase(), 0..25),
        sales in prop::collection::vec(arb_sale(), 0..25),
        opening in arb_opening(),
    ) {
        let report = valuate(&purchases, &sales, opening.as_ref()).unwrap();

        prop_assert!(report.totals.is_conserved());
        prop_assert!(report.totals.is_value_conserved());

        let cogs: Decimal = report.sales.iter().map(|s| s.cost_of_goods_sold).sum();
        prop_assert_eq!(cogs, report.total_cogs);

        let oversold: u64 = report.sales.iter().map(|s| s.unsatisfied).sum();
        prop_assert_eq!(oversold, report.oversold_quantity);
    }

    /// Each sale's COGS is the sum of its draws and lies between the cheapest
    /// and dearest layer cost.
    #[test]
    fn prop_sale_cost_bounded_by_layer_costs(
        purchases in prop::collection::vec(arb_purchase(), 1..25),
        sales in prop::collection::vec(arb_sale(), 1..25),
    ) {
        let report = valuate(&purchases, &sales, None).unwrap();
        let min = purchases.iter().map(|p| p.unit_cost).min().unwrap();
        let max = purchases.iter().map(|p| p.unit_cost).max().unwrap();

        for result in &report.sales {
            let drawn: Decimal = result.layers_consumed.iter().map(|d| d.cost()).sum();
            prop_assert_eq!(drawn, result.cost_of_goods_sold);

            let units = Decimal::from(result.satisfied());
            prop_assert!(result.cost_of_goods_sold >= min * units);
            prop_assert!(result.cost_of_goods_sold <= max * units);
        }
    }

    /// Remaining layers are non-empty and ordered most recent first.
    #[test]
    fn prop_remaining_layers_newest_first(
        purchases in prop::collection::vec(arb_purchase(), 0..25),
        sales in prop::collection::vec(arb_sale(), 0..25),
        opening in arb_opening(),
    ) {
        let report = valuate(&purchases, &sales, opening.as_ref()).unwrap();

        prop_assert!(report.remaining_layers.iter().all(|l| l.quantity > 0));
        for pair in report.remaining_layers.windows(2) {
            prop_assert!(pair[0].sort_key() > pair[1].sort_key());
        }
    }
}

// ============================================================================
// Determinism
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Valuating the same inputs twice yields equal reports.
    #[test]
    fn prop_valuation_idempotent(
        purchases in prop::collection::vec(arb_purchase(), 0..25),
        sales in prop::collection::vec(arb_sale(), 0..25),
        opening in arb_opening(),
    ) {
        let first = valuate(&purchases, &sales, opening.as_ref()).unwrap();
        let second = valuate(&purchases, &sales, opening.as_ref()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// With distinct purchase dates the input order of purchases is irrelevant.
    #[test]
    fn prop_purchase_order_irrelevant_for_distinct_dates(
        offsets in prop::collection::btree_set(0u64..730, 1..20),
        quantity in 1u64..50,
        sales in prop::collection::vec(arb_sale(), 0..20),
    ) {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let purchases: Vec<_> = offsets
            .iter()
            .map(|&o| PurchaseEvent::new(start + Days::new(o), quantity, Decimal::from(o)))
            .collect();
        let mut reversed = purchases.clone();
        reversed.reverse();

        let forward = valuate(&purchases, &sales, None).unwrap();
        let backward = valuate(&reversed, &sales, None).unwrap();

        prop_assert_eq!(forward.total_cogs, backward.total_cogs);
        prop_assert_eq!(forward.remaining_layers.len(), backward.remaining_layers.len());
        prop_assert_eq!(forward.remaining_value, backward.remaining_value);
    }

    /// The statement's closing stock always matches the report.
    #[test]
    fn prop_statement_closing_stock_matches(
        purchases in prop::collection::vec(arb_purchase(), 0..25),
        sales in prop::collection::vec(arb_sale(), 0..25),
        opening in arb_opening(),
    ) {
        let ledger = Ledger {
            purchases,
            sales,
            opening,
        };
        let report = valuate_ledger(&ledger).unwrap();
        let statement = Statement::build(&ledger, &report, &MarginPolicy::default());

        let expected_rows =
            ledger.purchases.len() + ledger.sales.len() + usize::from(ledger.opening.is_some());
        prop_assert_eq!(statement.rows.len(), expected_rows);
        if !statement.rows.is_empty() {
            prop_assert_eq!(statement.closing_stock(), report.remaining_quantity);
        }
    }
}
