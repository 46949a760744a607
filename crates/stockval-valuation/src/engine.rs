//! The LIFO valuation engine.

use rust_decimal::Decimal;
use stockval_core::{
    validate_events, LayerStack, Ledger, OpeningStock, PurchaseEvent, SaleEvent, ValidationError,
};
use thiserror::Error;

use crate::report::{SaleResult, ValuationReport};

/// Errors that stop a valuation run before any layer is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValuationError {
    /// An input event is malformed.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ValidationError),
}

/// Valuate a ledger with LIFO cost-layer consumption.
///
/// Purchases may be supplied in any order; they are layered oldest first
/// (stable on equal dates). Sales are processed exactly in the order supplied,
/// and each one draws from whatever layer is currently the most recently
/// acquired. A sale that outruns the available stock is costed for the part
/// that could be satisfied and reports the rest in
/// [`SaleResult::unsatisfied`].
///
/// The inputs are only borrowed, so calling this twice with the same inputs
/// yields equal reports.
pub fn valuate(
    purchases: &[PurchaseEvent],
    sales: &[SaleEvent],
    opening: Option<&OpeningStock>,
) -> Result<ValuationReport, ValuationError> {
    validate_events(purchases, sales, opening)?;

    let mut stack = LayerStack::from_ledger(purchases, opening);
    let mut results = Vec::with_capacity(sales.len());
    let mut total_cogs = Decimal::ZERO;

    for sale in sales {
        let drawn = stack.draw_lifo(sale.quantity);
        total_cogs += drawn.cost;
        results.push(SaleResult::from_draw(sale, drawn));
    }

    Ok(ValuationReport::assemble(
        purchases,
        sales,
        opening,
        results,
        stack.into_layers_newest_first(),
        total_cogs,
    ))
}

/// Valuate a [`Ledger`].
pub fn valuate_ledger(ledger: &Ledger) -> Result<ValuationReport, ValuationError> {
    valuate(&ledger.purchases, &ledger.sales, ledger.opening.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use stockval_core::{EventKind, LayerId};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn purchase(day: u32, quantity: u64, cost: Decimal) -> PurchaseEvent {
        PurchaseEvent::new(date(2024, 1, day), quantity, cost)
    }

    fn sale(day: u32, quantity: u64) -> SaleEvent {
        SaleEvent::new(date(2024, 2, day), quantity)
    }

    #[test]
    fn test_newest_layer_drained_first() {
        let purchases = [purchase(1, 5, dec!(10)), purchase(2, 3, dec!(20))];
        let report = valuate(&purchases, &[sale(1, 4)], None).unwrap();

        assert_eq!(report.sales[0].cost_of_goods_sold, dec!(70));
        assert_eq!(report.total_cogs, dec!(70));
        assert_eq!(report.remaining_quantity, 4);
        assert_eq!(report.remaining_layers.len(), 1);
        assert_eq!(report.remaining_layers[0].unit_cost, dec!(10));
    }

    #[test]
    fn test_exact_drain_is_never_reselected() {
        let purchases = [purchase(1, 3, dec!(10))];
        let report = valuate(&purchases, &[sale(1, 3), sale(2, 1)], None).unwrap();

        assert_eq!(report.sales[0].cost_of_goods_sold, dec!(30));
        assert!(!report.sales[0].is_oversold());

        let second = &report.sales[1];
        assert!(second.is_oversold());
        assert_eq!(second.unsatisfied, 1);
        assert_eq!(second.cost_of_goods_sold, Decimal::ZERO);
        assert!(second.layers_consumed.is_empty());
        assert_eq!(report.oversold_quantity, 1);
    }

    #[test]
    fn test_partial_layer_split() {
        let purchases = [purchase(1, 10, dec!(5))];

        let report = valuate(&purchases, &[sale(1, 4)], None).unwrap();
        assert_eq!(report.remaining_layers[0].quantity, 6);
        assert_eq!(report.remaining_layers[0].unit_cost, dec!(5));

        let report = valuate(&purchases, &[sale(1, 4), sale(2, 6)], None).unwrap();
        assert_eq!(report.sales[1].cost_of_goods_sold, dec!(30));
        assert!(report.remaining_layers.is_empty());
        assert_eq!(report.remaining_quantity, 0);
    }

    #[test]
    fn test_no_sales_leaves_purchases_untouched() {
        let purchases = [purchase(2, 3, dec!(20)), purchase(1, 5, dec!(10))];
        let report = valuate(&purchases, &[], None).unwrap();

        assert_eq!(report.total_cogs, Decimal::ZERO);
        assert_eq!(report.remaining_quantity, 8);
        assert_eq!(report.remaining_value, dec!(110));
        // Most recently acquired first
        assert_eq!(report.remaining_layers[0].acquired_at, Some(date(2024, 1, 2)));
        assert_eq!(report.remaining_layers[1].acquired_at, Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_no_purchases_everything_oversold() {
        let report = valuate(&[], &[sale(1, 2), sale(2, 5)], None).unwrap();

        assert!(report.sales.iter().all(SaleResult::is_oversold));
        assert!(report.sales.iter().all(|s| s.satisfied() == 0));
        assert_eq!(report.total_cogs, Decimal::ZERO);
        assert_eq!(report.oversold_quantity, 7);
    }

    #[test]
    fn test_opening_stock_is_oldest_layer() {
        let purchases = [purchase(1, 2, dec!(30))];
        let opening = OpeningStock::new(10, dec!(12));
        let report = valuate(&purchases, &[sale(1, 5)], Some(&opening)).unwrap();

        let result = &report.sales[0];
        assert_eq!(result.cost_of_goods_sold, dec!(96)); // 2 * 30 + 3 * 12
        assert_eq!(result.layers_consumed[1].layer, LayerId::OPENING);
        assert_eq!(report.remaining_quantity, 7);
        assert_eq!(report.remaining_value, dec!(84));
    }

    #[test]
    fn test_sales_processed_in_supplied_order() {
        // Sales newest first, as the loader presents them. Each sale still draws
        // from the newest remaining layer.
        let purchases = [purchase(1, 2, dec!(10)), purchase(5, 2, dec!(50))];
        let sales = [sale(9, 3), sale(3, 1)];
        let report = valuate(&purchases, &sales, None).unwrap();

        assert_eq!(report.sales[0].occurred_at, date(2024, 2, 9));
        assert_eq!(report.sales[0].cost_of_goods_sold, dec!(110));
        assert_eq!(report.sales[1].cost_of_goods_sold, dec!(10));
        assert_eq!(report.remaining_quantity, 0);
    }

    #[test]
    fn test_tie_break_later_input_is_newer() {
        let purchases = [purchase(1, 1, dec!(10)), purchase(1, 1, dec!(20))];
        for _ in 0..3 {
            let report = valuate(&purchases, &[sale(1, 1)], None).unwrap();
            assert_eq!(report.sales[0].cost_of_goods_sold, dec!(20));
            assert_eq!(report.sales[0].layers_consumed[0].layer, LayerId(2));
        }
    }

    #[test]
    fn test_malformed_input_rejected() {
        let purchases = [purchase(1, 5, dec!(10)), purchase(2, 0, dec!(10))];
        let err = valuate(&purchases, &[sale(1, 1)], None).unwrap_err();
        assert_eq!(
            err,
            ValuationError::MalformedInput(ValidationError::ZeroQuantity {
                kind: EventKind::Purchase,
                index: 1,
            })
        );
        assert_eq!(err.to_string(), "malformed input: purchase #1 has zero quantity");
    }

    #[test]
    fn test_oversized_inputs_rejected_not_panicking() {
        let huge = [purchase(1, u64::MAX, dec!(10000000000))];
        assert_eq!(
            valuate(&huge, &[], None),
            Err(ValuationError::MalformedInput(ValidationError::Overflow {
                kind: EventKind::Purchase,
            }))
        );

        let units = [purchase(1, u64::MAX, dec!(1)), purchase(2, 1, dec!(1))];
        assert!(matches!(
            valuate(&units, &[sale(1, 1)], None),
            Err(ValuationError::MalformedInput(ValidationError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_largest_valid_ledger_is_valuated() {
        let purchases = [purchase(1, u64::MAX - 1, dec!(1)), purchase(2, 1, dec!(2))];
        let report = valuate(&purchases, &[sale(1, u64::MAX)], None).unwrap();
        assert_eq!(report.remaining_quantity, 0);
        assert_eq!(report.total_cogs, Decimal::from(u64::MAX) + Decimal::ONE);
        assert!(report.totals.is_conserved());
    }

    #[test]
    fn test_inputs_not_mutated_and_rerun_is_identical() {
        let purchases = vec![purchase(1, 5, dec!(10.5)), purchase(2, 3, dec!(20.25))];
        let sales = vec![sale(1, 4), sale(2, 6)];
        let before = (purchases.clone(), sales.clone());

        let first = valuate(&purchases, &sales, None).unwrap();
        let second = valuate(&purchases, &sales, None).unwrap();

        assert_eq!(first, second);
        assert_eq!((purchases, sales), before);
    }

    #[test]
    fn test_valuate_ledger() {
        let ledger = Ledger::new()
            .with_opening(OpeningStock::new(1, dec!(3)))
            .with_purchase(purchase(1, 1, dec!(5)))
            .with_sale(sale(1, 2));
        let report = valuate_ledger(&ledger).unwrap();
        assert_eq!(report.total_cogs, dec!(8));
    }
}
