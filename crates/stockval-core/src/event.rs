//! Ledger events: stock purchases, stock sales and opening stock.
//!
//! Events are immutable inputs. The valuation engine borrows them and never
//! mutates them; all layer state lives in a [`LayerStack`](crate::LayerStack).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The kind of event a [`ValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A stock purchase.
    Purchase,
    /// A stock sale.
    Sale,
    /// The opening stock snapshot.
    Opening,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase => write!(f, "purchase"),
            Self::Sale => write!(f, "sale"),
            Self::Opening => write!(f, "opening stock"),
        }
    }
}

/// An event that cannot be valuated.
///
/// `index` is the zero-based position of the event in the sequence it was
/// supplied in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Purchases and sales must move at least one unit.
    #[error("{kind} #{index} has zero quantity")]
    ZeroQuantity {
        /// Kind of the offending event.
        kind: EventKind,
        /// Position of the event in its sequence.
        index: usize,
    },
    /// Unit costs must not be negative.
    #[error("{kind} #{index} has negative unit cost {unit_cost}")]
    NegativeUnitCost {
        /// Kind of the offending event.
        kind: EventKind,
        /// Position of the event in its sequence.
        index: usize,
        /// The rejected cost.
        unit_cost: Decimal,
    },
    /// Selling prices must not be negative.
    #[error("sale #{index} has negative unit price {unit_price}")]
    NegativeUnitPrice {
        /// Position of the sale.
        index: usize,
        /// The rejected price.
        unit_price: Decimal,
    },
    /// Quantities or amounts add up past what can be represented.
    #[error("{kind} totals exceed the supported range")]
    Overflow {
        /// Kind of the events whose totals overflow.
        kind: EventKind,
    },
}

/// Stock received into inventory at a per-unit cost.
///
/// Every purchase becomes exactly one cost layer when a ledger is valuated.
///
/// # Examples
///
/// ```
/// use stockval_core::PurchaseEvent;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let purchase = PurchaseEvent::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), 12, dec!(2500));
/// assert_eq!(purchase.amount(), dec!(30000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseEvent {
    /// Date the stock was acquired
    pub occurred_at: NaiveDate,
    /// Units received
    pub quantity: u64,
    /// Cost per unit
    pub unit_cost: Decimal,
}

impl PurchaseEvent {
    /// Create a new purchase.
    #[must_use]
    pub const fn new(occurred_at: NaiveDate, quantity: u64, unit_cost: Decimal) -> Self {
        Self {
            occurred_at,
            quantity,
            unit_cost,
        }
    }

    /// Total purchase amount (`quantity * unit_cost`).
    ///
    /// Validated purchases never overflow here; see [`Self::checked_amount`].
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }

    /// Total purchase amount, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn checked_amount(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_cost)
    }

    /// Check that this purchase can become a cost layer.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: EventKind::Purchase,
                index,
            });
        }
        if self.unit_cost.is_sign_negative() && !self.unit_cost.is_zero() {
            return Err(ValidationError::NegativeUnitCost {
                kind: EventKind::Purchase,
                index,
                unit_cost: self.unit_cost,
            });
        }
        Ok(())
    }
}

impl fmt::Display for PurchaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} purchase {} @ {}",
            self.occurred_at, self.quantity, self.unit_cost
        )
    }
}

/// Stock sold out of inventory.
///
/// The engine only needs the quantity; the optional unit price is the selling
/// price recorded on the order line and feeds the sale totals and profit
/// columns of the report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleEvent {
    /// Date of the sale
    pub occurred_at: NaiveDate,
    /// Units sold
    pub quantity: u64,
    /// Selling price per unit (if recorded)
    pub unit_price: Option<Decimal>,
}

impl SaleEvent {
    /// Create a new sale without a selling price.
    #[must_use]
    pub const fn new(occurred_at: NaiveDate, quantity: u64) -> Self {
        Self {
            occurred_at,
            quantity,
            unit_price: None,
        }
    }

    /// Attach the selling price per unit.
    #[must_use]
    pub const fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    /// Total sale amount, or zero when no price was recorded.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.unit_price
            .map_or(Decimal::ZERO, |price| Decimal::from(self.quantity) * price)
    }

    /// Total sale amount, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn checked_amount(&self) -> Option<Decimal> {
        self.unit_price.map_or(Some(Decimal::ZERO), |price| {
            Decimal::from(self.quantity).checked_mul(price)
        })
    }

    /// Check that this sale can be valuated.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                kind: EventKind::Sale,
                index,
            });
        }
        if let Some(price) = self.unit_price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(ValidationError::NegativeUnitPrice {
                    index,
                    unit_price: price,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SaleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sale {}", self.occurred_at, self.quantity)?;
        if let Some(price) = self.unit_price {
            write!(f, " @ {price}")?;
        }
        Ok(())
    }
}

/// Inventory on hand before the first ledger event.
///
/// Opening stock is valuated as the oldest layer: it is only drawn once every
/// purchase layer has been exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpeningStock {
    /// Units on hand
    pub quantity: u64,
    /// Cost per unit
    pub unit_cost: Decimal,
}

impl OpeningStock {
    /// Create an opening stock snapshot.
    #[must_use]
    pub const fn new(quantity: u64, unit_cost: Decimal) -> Self {
        Self {
            quantity,
            unit_cost,
        }
    }

    /// Book value of the opening stock.
    #[must_use]
    pub fn value(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_cost
    }

    /// Book value, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn checked_value(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_cost)
    }

    /// Check the snapshot. A zero quantity is allowed and simply yields no layer.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.unit_cost.is_sign_negative() && !self.unit_cost.is_zero() {
            return Err(ValidationError::NegativeUnitCost {
                kind: EventKind::Opening,
                index: 0,
                unit_cost: self.unit_cost,
            });
        }
        Ok(())
    }
}

/// One product's stock ledger.
///
/// `purchases` may be in any order; the engine sorts them by date. `sales` are
/// processed in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Inbound stock
    pub purchases: Vec<PurchaseEvent>,
    /// Outbound stock, in processing order
    pub sales: Vec<SaleEvent>,
    /// Stock on hand before the ledger window
    pub opening: Option<OpeningStock>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a purchase.
    #[must_use]
    pub fn with_purchase(mut self, purchase: PurchaseEvent) -> Self {
        self.purchases.push(purchase);
        self
    }

    /// Add a sale.
    #[must_use]
    pub fn with_sale(mut self, sale: SaleEvent) -> Self {
        self.sales.push(sale);
        self
    }

    /// Set the opening stock.
    #[must_use]
    pub const fn with_opening(mut self, opening: OpeningStock) -> Self {
        self.opening = Some(opening);
        self
    }

    /// Check whether the ledger holds no events at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty() && self.sales.is_empty() && self.opening.is_none()
    }

    /// Validate every event, returning the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_events(&self.purchases, &self.sales, self.opening.as_ref())
    }
}

/// Validate a set of ledger inputs, returning the first problem found.
///
/// Opening stock is checked first, then purchases, then sales. Finally the
/// inbound and outbound totals are checked to fit in `u64` units and
/// [`Decimal`] amounts. Every layer, draw and total of a valuation is bounded
/// by these sums, so validated inputs never overflow.
pub fn validate_events(
    purchases: &[PurchaseEvent],
    sales: &[SaleEvent],
    opening: Option<&OpeningStock>,
) -> Result<(), ValidationError> {
    if let Some(opening) = opening {
        opening.validate()?;
    }
    for (index, purchase) in purchases.iter().enumerate() {
        purchase.validate(index)?;
    }
    for (index, sale) in sales.iter().enumerate() {
        sale.validate(index)?;
    }
    check_totals(purchases, sales, opening)
}

fn check_totals(
    purchases: &[PurchaseEvent],
    sales: &[SaleEvent],
    opening: Option<&OpeningStock>,
) -> Result<(), ValidationError> {
    let overflow = |kind: EventKind| ValidationError::Overflow { kind };

    let (opening_units, opening_value) = match opening {
        Some(stock) => (
            stock.quantity,
            stock.checked_value().ok_or_else(|| overflow(EventKind::Opening))?,
        ),
        None => (0, Decimal::ZERO),
    };

    purchases
        .iter()
        .try_fold((opening_units, opening_value), |(units, value), p| {
            Some((
                units.checked_add(p.quantity)?,
                value.checked_add(p.checked_amount()?)?,
            ))
        })
        .ok_or_else(|| overflow(EventKind::Purchase))?;

    sales
        .iter()
        .try_fold((0_u64, Decimal::ZERO), |(units, amount), s| {
            Some((
                units.checked_add(s.quantity)?,
                amount.checked_add(s.checked_amount()?)?,
            ))
        })
        .ok_or_else(|| overflow(EventKind::Sale))?;

    Ok(())
}
