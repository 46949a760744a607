//! Report assembly: caller-facing totals over a valuated ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockval_core::{OpeningStock, PurchaseEvent, SaleEvent};

use crate::report::SaleResult;

/// Aggregate figures for one ledger.
///
/// These are the numbers the totals row of an inventory report shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Units on hand before the ledger window
    pub opening_quantity: u64,
    /// Book value of the opening stock
    pub opening_value: Decimal,
    /// Units purchased
    pub purchase_quantity: u64,
    /// Amount spent on purchases
    pub purchase_amount: Decimal,
    /// Units sold (requested)
    pub sale_quantity: u64,
    /// Units sold that could be costed
    pub satisfied_quantity: u64,
    /// Sales revenue (sales without a recorded price count as zero)
    pub sale_amount: Decimal,
    /// Cost of goods sold
    pub cost_of_goods_sold: Decimal,
    /// Units left in stock
    pub remaining_quantity: u64,
    /// Book value of the stock left
    pub remaining_value: Decimal,
}

impl LedgerTotals {
    /// Aggregate the raw inputs and the per-sale results.
    #[must_use]
    pub fn assemble(
        purchases: &[PurchaseEvent],
        sales: &[SaleEvent],
        opening: Option<&OpeningStock>,
        results: &[SaleResult],
        remaining_quantity: u64,
        remaining_value: Decimal,
    ) -> Self {
        Self {
            opening_quantity: opening.map_or(0, |o| o.quantity),
            opening_value: opening.map_or(Decimal::ZERO, OpeningStock::value),
            purchase_quantity: purchases.iter().map(|p| p.quantity).sum(),
            purchase_amount: purchases.iter().map(PurchaseEvent::amount).sum(),
            sale_quantity: sales.iter().map(|s| s.quantity).sum(),
            satisfied_quantity: results.iter().map(SaleResult::satisfied).sum(),
            sale_amount: sales.iter().map(SaleEvent::amount).sum(),
            cost_of_goods_sold: results.iter().map(|r| r.cost_of_goods_sold).sum(),
            remaining_quantity,
            remaining_value,
        }
    }

    /// Units sold that no layer could cover.
    #[must_use]
    pub const fn oversold_quantity(&self) -> u64 {
        self.sale_quantity - self.satisfied_quantity
    }

    /// Check that opening + purchased - sold equals what is left.
    #[must_use]
    pub const fn is_conserved(&self) -> bool {
        self.opening_quantity + self.purchase_quantity
            == self.satisfied_quantity + self.remaining_quantity
    }

    /// Check that book value is conserved: opening value + purchases equals
    /// COGS + remaining value.
    #[must_use]
    pub fn is_value_conserved(&self) -> bool {
        self.opening_value + self.purchase_amount == self.cost_of_goods_sold + self.remaining_value
    }

    /// Sales revenue minus cost of goods sold.
    #[must_use]
    pub fn gross_profit(&self) -> Decimal {
        self.sale_amount - self.cost_of_goods_sold
    }
}
