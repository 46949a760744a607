//! The LIFO layer stack.
//!
//! A [`LayerStack`] holds the cost layers of one valuation run, ordered by
//! acquisition date and ingestion order. The last element is the top of the
//! stack: the most recently acquired layer, which is always drawn first.
//!
//! Layers never hold zero units. A layer that is drained by a draw is removed
//! on the spot, so it can never be selected again.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CostLayer, LayerId, OpeningStock, PurchaseEvent};

/// Units taken from a single layer by one draw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Draw {
    /// The layer the units came from
    pub layer: LayerId,
    /// Acquisition date of that layer (`None` for opening stock)
    pub acquired_at: Option<NaiveDate>,
    /// Unit cost of that layer
    pub unit_cost: Decimal,
    /// Units taken
    pub quantity: u64,
}

impl Draw {
    /// Cost attributed to the units taken.
    #[must_use]
    pub fn cost(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }
}

/// Result of drawing units from the stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    /// Layers drawn from, top of the stack first.
    pub draws: Vec<Draw>,
    /// Total cost of the drawn units.
    pub cost: Decimal,
    /// Units that could not be drawn because the stack ran empty.
    pub unsatisfied: u64,
}

impl DrawResult {
    /// Units actually drawn.
    #[must_use]
    pub fn drawn(&self) -> u64 {
        self.draws.iter().map(|d| d.quantity).sum()
    }
}

/// Cost layers ordered by `(acquired_at, id)`, newest on top.
///
/// # Examples
///
/// ```
/// use stockval_core::{LayerStack, OpeningStock, PurchaseEvent};
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let purchases = [PurchaseEvent::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 3, dec!(10))];
/// let mut stack = LayerStack::from_ledger(&purchases, Some(&OpeningStock::new(2, dec!(7))));
///
/// let drawn = stack.draw_lifo(6);
/// assert_eq!(drawn.cost, dec!(44)); // 3 * 10 + 2 * 7
/// assert_eq!(drawn.unsatisfied, 1);
/// assert!(stack.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<CostLayer>,
    next_id: usize,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    /// Create an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            layers: Vec::new(),
            next_id: 1,
        }
    }

    /// Build the stack for a ledger.
    ///
    /// Opening stock (if any units) becomes the bottom layer. Purchases are
    /// ingested oldest first; purchases on the same date keep their input
    /// order, so the later one in the input gets the higher [`LayerId`] and is
    /// treated as more recent.
    #[must_use]
    pub fn from_ledger(purchases: &[PurchaseEvent], opening: Option<&OpeningStock>) -> Self {
        let mut stack = Self::new();

        if let Some(stock) = opening {
            if stock.quantity > 0 {
                stack.layers.push(CostLayer::opening(stock));
            }
        }

        let mut ordered: Vec<&PurchaseEvent> = purchases.iter().collect();
        ordered.sort_by_key(|p| p.occurred_at);
        for purchase in ordered {
            stack.push_purchase(purchase);
        }

        stack
    }

    /// Ingest a purchase as a new layer and return its id.
    ///
    /// The layer is placed by acquisition date, so a purchase dated before the
    /// current top does not become the top. Zero-quantity purchases still get
    /// an id but create no layer.
    pub fn push_purchase(&mut self, purchase: &PurchaseEvent) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id += 1;

        let layer = CostLayer::from_purchase(id, purchase);
        if !layer.is_empty() {
            let key = layer.sort_key();
            let pos = self.layers.partition_point(|l| l.sort_key() < key);
            self.layers.insert(pos, layer);
        }
        id
    }

    /// The most recently acquired layer, if any.
    #[must_use]
    pub fn top(&self) -> Option<&CostLayer> {
        self.layers.last()
    }

    /// Number of layers holding stock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if no stock is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total units across all layers.
    #[must_use]
    pub fn quantity(&self) -> u64 {
        self.layers.iter().map(|l| l.quantity).sum()
    }

    /// Total book value across all layers.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.layers.iter().map(CostLayer::value).sum()
    }

    /// Layers from oldest to newest.
    #[must_use]
    pub fn layers(&self) -> &[CostLayer] {
        &self.layers
    }

    /// Layers from newest to oldest (drawing order).
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &CostLayer> {
        self.layers.iter().rev()
    }

    /// Consume the stack, returning the layers newest first.
    #[must_use]
    pub fn into_layers_newest_first(self) -> Vec<CostLayer> {
        let mut layers = self.layers;
        layers.reverse();
        layers
    }

    /// Draw `units` from the stack, newest layer first.
    ///
    /// Each layer gives up `min(remaining, layer.quantity)` units; a layer that
    /// reaches zero is removed. If the stack runs empty the rest of the request
    /// is reported as [`DrawResult::unsatisfied`] instead of failing.
    pub fn draw_lifo(&mut self, units: u64) -> DrawResult {
        let mut remaining = units;
        let mut draws = Vec::new();
        let mut cost = Decimal::ZERO;

        while remaining > 0 {
            let Some(layer) = self.layers.last_mut() else {
                break;
            };

            let taken = layer.take(remaining);
            cost += layer.cost_of(taken);
            draws.push(Draw {
                layer: layer.id,
                acquired_at: layer.acquired_at,
                unit_cost: layer.unit_cost,
                quantity: taken,
            });
            remaining -= taken;

            if layer.is_empty() {
                self.layers.pop();
            }
        }

        DrawResult {
            draws,
            cost,
            unsatisfied: remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn purchase(day: u32, quantity: u64, cost: Decimal) -> PurchaseEvent {
        PurchaseEvent::new(date(2024, 1, day), quantity, cost)
    }

    #[test]
    fn test_from_ledger_orders_by_date_not_input() {
        // Newer purchase supplied first
        let purchases = [purchase(2, 10, dec!(150)), purchase(1, 10, dec!(100))];
        let stack = LayerStack::from_ledger(&purchases, None);

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top().unwrap().unit_cost, dec!(150));
        // Ids follow ingestion order (sorted by date)
        assert_eq!(stack.layers()[0].id, LayerId(1));
        assert_eq!(stack.layers()[1].id, LayerId(2));
    }

    #[test]
    fn test_draw_spills_into_older_layer() {
        let purchases = [purchase(1, 5, dec!(10)), purchase(2, 3, dec!(20))];
        let mut stack = LayerStack::from_ledger(&purchases, None);

        let drawn = stack.draw_lifo(4);
        assert_eq!(drawn.cost, dec!(70));
        assert_eq!(drawn.unsatisfied, 0);
        assert_eq!(drawn.draws.len(), 2);
        assert_eq!(drawn.draws[0].layer, LayerId(2));
        assert_eq!(drawn.draws[0].quantity, 3);
        assert_eq!(drawn.draws[1].layer, LayerId(1));
        assert_eq!(drawn.draws[1].quantity, 1);

        // Drained layer is gone, older layer split
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().unwrap().quantity, 4);
    }

    #[test]
    fn test_exact_drain_removes_layer() {
        let mut stack = LayerStack::from_ledger(&[purchase(1, 3, dec!(10))], None);

        let first = stack.draw_lifo(3);
        assert_eq!(first.cost, dec!(30));
        assert!(stack.is_empty());

        let second = stack.draw_lifo(1);
        assert!(second.draws.is_empty());
        assert_eq!(second.cost, Decimal::ZERO);
        assert_eq!(second.unsatisfied, 1);
    }

    #[test]
    fn test_opening_stock_is_drawn_last() {
        let purchases = [purchase(1, 2, dec!(10))];
        let opening = OpeningStock::new(5, dec!(4));
        let mut stack = LayerStack::from_ledger(&purchases, Some(&opening));

        let drawn = stack.draw_lifo(3);
        assert_eq!(drawn.cost, dec!(24)); // 2 * 10 + 1 * 4
        assert_eq!(drawn.draws[1].layer, LayerId::OPENING);
        assert_eq!(drawn.draws[1].acquired_at, None);
        assert_eq!(stack.quantity(), 4);
        assert_eq!(stack.value(), dec!(16));
    }

    #[test]
    fn test_empty_opening_creates_no_layer() {
        let stack = LayerStack::from_ledger(&[], Some(&OpeningStock::new(0, dec!(4))));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_same_date_later_input_drawn_first() {
        let purchases = [purchase(1, 1, dec!(10)), purchase(1, 1, dec!(20))];
        let mut stack = LayerStack::from_ledger(&purchases, None);

        let drawn = stack.draw_lifo(1);
        assert_eq!(drawn.cost, dec!(20));
        assert_eq!(drawn.draws[0].layer, LayerId(2));
    }

    #[test]
    fn test_push_backdated_purchase_stays_below_top() {
        let mut stack = LayerStack::from_ledger(&[purchase(10, 1, dec!(50))], None);
        let id = stack.push_purchase(&purchase(5, 1, dec!(5)));

        assert_eq!(id, LayerId(2));
        assert_eq!(stack.top().unwrap().unit_cost, dec!(50));
        let newest_first: Vec<_> = stack.iter_newest_first().map(|l| l.id).collect();
        assert_eq!(newest_first, vec![LayerId(1), LayerId(2)]);
    }

    #[test]
    fn test_into_layers_newest_first() {
        let purchases = [
            purchase(1, 1, dec!(1)),
            purchase(3, 1, dec!(3)),
            purchase(2, 1, dec!(2)),
        ];
        let stack = LayerStack::from_ledger(&purchases, None);
        let costs: Vec<_> = stack
            .into_layers_newest_first()
            .into_iter()
            .map(|l| l.unit_cost)
            .collect();
        assert_eq!(costs, vec![dec!(3), dec!(2), dec!(1)]);
    }

    #[test]
    fn test_draw_zero_units_is_noop() {
        let mut stack = LayerStack::from_ledger(&[purchase(1, 2, dec!(10))], None);
        let drawn = stack.draw_lifo(0);
        assert_eq!(drawn, DrawResult::default());
        assert_eq!(stack.quantity(), 2);
    }
}
