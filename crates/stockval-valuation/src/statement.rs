//! The inventory statement (stock card).
//!
//! A [`Statement`] lays a valuated ledger out as table rows: the opening
//! balance, every purchase in date order, then every sale in processing order.
//! Each row carries the stock on hand after it, and sale rows carry their COGS.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockval_core::{Ledger, PurchaseEvent};

use crate::engine::{valuate_ledger, ValuationError};
use crate::margin::MarginPolicy;
use crate::report::{SaleResult, ValuationReport};
use crate::totals::LedgerTotals;

/// What a statement row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
    /// Stock on hand before the ledger window
    Opening,
    /// Stock received
    Purchase,
    /// Stock sold
    Sale,
}

/// One line of the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    /// What the row records
    pub kind: RowKind,
    /// Event date (`None` for the opening row)
    pub date: Option<NaiveDate>,
    /// Units received
    pub purchase_quantity: Option<u64>,
    /// Cost per unit received
    pub purchase_unit_cost: Option<Decimal>,
    /// Total cost of units received
    pub purchase_total: Option<Decimal>,
    /// Units sold
    pub sale_quantity: Option<u64>,
    /// Selling price per unit
    pub sale_unit_price: Option<Decimal>,
    /// Total sale amount
    pub sale_total: Option<Decimal>,
    /// Units on hand after this row
    pub stock: u64,
    /// Cost of goods sold for this sale
    pub cogs: Option<Decimal>,
    /// Units of this sale no layer could cover
    pub unsatisfied: Option<u64>,
    /// Markup price over the sale's average unit cost
    pub suggested_unit_price: Option<Decimal>,
    /// Sale amount minus COGS (priced sales only)
    pub gross_profit: Option<Decimal>,
    /// Gross profit as a percentage of the sale amount
    pub margin_percent: Option<Decimal>,
}

impl StatementRow {
    const fn empty(kind: RowKind, date: Option<NaiveDate>, stock: u64) -> Self {
        Self {
            kind,
            date,
            purchase_quantity: None,
            purchase_unit_cost: None,
            purchase_total: None,
            sale_quantity: None,
            sale_unit_price: None,
            sale_total: None,
            stock,
            cogs: None,
            unsatisfied: None,
            suggested_unit_price: None,
            gross_profit: None,
            margin_percent: None,
        }
    }
}

/// A full inventory statement with its totals row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// Table rows in display order
    pub rows: Vec<StatementRow>,
    /// Totals row
    pub totals: LedgerTotals,
}

impl Statement {
    /// Valuate `ledger` and lay it out.
    pub fn valuate(ledger: &Ledger, margin: &MarginPolicy) -> Result<Self, ValuationError> {
        let report = valuate_ledger(ledger)?;
        Ok(Self::build(ledger, &report, margin))
    }

    /// Lay out `ledger` using the results in `report`.
    ///
    /// `report` should come from valuating this same ledger; sale rows are
    /// paired with sale results by position. Running stock only drops by the
    /// units a sale actually drew, so the last row's stock equals the report's
    /// remaining quantity. With a mismatched report the running stock
    /// saturates at zero instead of wrapping.
    #[must_use]
    pub fn build(ledger: &Ledger, report: &ValuationReport, margin: &MarginPolicy) -> Self {
        let mut rows = Vec::with_capacity(1 + ledger.purchases.len() + ledger.sales.len());
        let mut stock = ledger.opening.map_or(0, |o| o.quantity);

        if ledger.opening.is_some() {
            rows.push(StatementRow::empty(RowKind::Opening, None, stock));
        }

        let mut purchases: Vec<&PurchaseEvent> = ledger.purchases.iter().collect();
        purchases.sort_by_key(|p| p.occurred_at);
        for purchase in purchases {
            stock = stock.saturating_add(purchase.quantity);
            let mut row = StatementRow::empty(RowKind::Purchase, Some(purchase.occurred_at), stock);
            row.purchase_quantity = Some(purchase.quantity);
            row.purchase_unit_cost = Some(purchase.unit_cost);
            row.purchase_total = Some(purchase.amount());
            rows.push(row);
        }

        for (sale, result) in ledger.sales.iter().zip(&report.sales) {
            stock = stock.saturating_sub(result.satisfied());
            let mut row = StatementRow::empty(RowKind::Sale, Some(sale.occurred_at), stock);
            row.sale_quantity = Some(sale.quantity);
            row.sale_unit_price = sale.unit_price;
            row.sale_total = sale.unit_price.map(|_| sale.amount());
            row.cogs = Some(result.cost_of_goods_sold);
            row.unsatisfied = Some(result.unsatisfied);
            row.suggested_unit_price = result
                .average_unit_cost()
                .and_then(|cost| margin.selling_price(cost));
            fill_profit(&mut row, result);
            rows.push(row);
        }

        Self {
            rows,
            totals: report.totals.clone(),
        }
    }

    /// Stock on hand after the last row.
    #[must_use]
    pub fn closing_stock(&self) -> u64 {
        self.rows.last().map_or(0, |r| r.stock)
    }

    /// Rows of one kind.
    pub fn rows_of(&self, kind: RowKind) -> impl Iterator<Item = &StatementRow> {
        self.rows.iter().filter(move |r| r.kind == kind)
    }
}

fn fill_profit(row: &mut StatementRow, result: &SaleResult) {
    let Some(amount) = row.sale_total else {
        return;
    };
    let Some(profit) = amount.checked_sub(result.cost_of_goods_sold) else {
        return;
    };
    row.gross_profit = Some(profit);
    row.margin_percent = profit
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(amount));
}
