//! Valuation results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockval_core::{CostLayer, Draw, DrawResult, OpeningStock, PurchaseEvent, SaleEvent};

use crate::totals::LedgerTotals;

/// The cost attributed to one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleResult {
    /// Date of the sale
    pub occurred_at: NaiveDate,
    /// Units requested by the sale
    pub quantity: u64,
    /// Cost of the units that could be satisfied
    pub cost_of_goods_sold: Decimal,
    /// Layers drawn from, in drawing order
    pub layers_consumed: Vec<Draw>,
    /// Units that no layer could cover
    pub unsatisfied: u64,
}

impl SaleResult {
    pub(crate) fn from_draw(sale: &SaleEvent, drawn: DrawResult) -> Self {
        Self {
            occurred_at: sale.occurred_at,
            quantity: sale.quantity,
            cost_of_goods_sold: drawn.cost,
            layers_consumed: drawn.draws,
            unsatisfied: drawn.unsatisfied,
        }
    }

    /// Units that were costed.
    #[must_use]
    pub const fn satisfied(&self) -> u64 {
        self.quantity - self.unsatisfied
    }

    /// Check if the sale outran the available stock.
    #[must_use]
    pub const fn is_oversold(&self) -> bool {
        self.unsatisfied > 0
    }

    /// Average cost per satisfied unit, if any unit was satisfied.
    #[must_use]
    pub fn average_unit_cost(&self) -> Option<Decimal> {
        match self.satisfied() {
            0 => None,
            units => Some(self.cost_of_goods_sold / Decimal::from(units)),
        }
    }
}

/// Everything a valuation run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationReport {
    /// Cost of goods sold across all sales
    pub total_cogs: Decimal,
    /// One result per sale, in processing order
    pub sales: Vec<SaleResult>,
    /// Layers still holding stock, most recently acquired first
    pub remaining_layers: Vec<CostLayer>,
    /// Units left across all layers
    pub remaining_quantity: u64,
    /// Book value of the remaining layers
    pub remaining_value: Decimal,
    /// Units sold that no layer could cover
    pub oversold_quantity: u64,
    /// Purchase, sale and stock totals
    pub totals: LedgerTotals,
}

impl ValuationReport {
    pub(crate) fn assemble(
        purchases: &[PurchaseEvent],
        sales: &[SaleEvent],
        opening: Option<&OpeningStock>,
        results: Vec<SaleResult>,
        remaining_layers: Vec<CostLayer>,
        total_cogs: Decimal,
    ) -> Self {
        let remaining_quantity = remaining_layers.iter().map(|l| l.quantity).sum();
        let remaining_value = remaining_layers.iter().map(CostLayer::value).sum();
        let oversold_quantity = results.iter().map(|r| r.unsatisfied).sum();
        let totals = LedgerTotals::assemble(
            purchases,
            sales,
            opening,
            &results,
            remaining_quantity,
            remaining_value,
        );

        Self {
            total_cogs,
            sales: results,
            remaining_layers,
            remaining_quantity,
            remaining_value,
            oversold_quantity,
            totals,
        }
    }

    /// Check if any sale outran the available stock.
    #[must_use]
    pub fn has_oversold(&self) -> bool {
        self.oversold_quantity > 0
    }

    /// Sales that could not be fully costed.
    pub fn oversold_sales(&self) -> impl Iterator<Item = &SaleResult> {
        self.sales.iter().filter(|s| s.is_oversold())
    }
}
