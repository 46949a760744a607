//! Cost layer type.
//!
//! A [`CostLayer`] is the unconsumed part of one purchase batch: how many units
//! are left and what each of them cost. Opening stock becomes a layer without
//! an acquisition date, which orders it before every purchase layer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{OpeningStock, PurchaseEvent};

/// Identifies a cost layer by its ingestion sequence number.
///
/// Opening stock is always [`LayerId::OPENING`]; purchases are numbered from 1
/// in the order they are ingested (ascending by date, ties in input order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub usize);

impl LayerId {
    /// The layer created from opening stock.
    pub const OPENING: Self = Self(0);

    /// Check if this is the opening stock layer.
    #[must_use]
    pub const fn is_opening(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opening() {
            write!(f, "opening")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Units still available from one acquisition, at their unit cost.
///
/// # Examples
///
/// ```
/// use stockval_core::{CostLayer, LayerId, PurchaseEvent};
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let purchase = PurchaseEvent::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 10, dec!(5));
/// let mut layer = CostLayer::from_purchase(LayerId(1), &purchase);
///
/// assert_eq!(layer.take(4), 4);
/// assert_eq!(layer.quantity, 6);
/// assert_eq!(layer.value(), dec!(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostLayer {
    /// Ingestion sequence number
    pub id: LayerId,
    /// Acquisition date (`None` for opening stock)
    pub acquired_at: Option<NaiveDate>,
    /// Units not yet consumed
    pub quantity: u64,
    /// Cost per unit
    pub unit_cost: Decimal,
}

impl CostLayer {
    /// Create a new layer.
    #[must_use]
    pub const fn new(
        id: LayerId,
        acquired_at: Option<NaiveDate>,
        quantity: u64,
        unit_cost: Decimal,
    ) -> Self {
        Self {
            id,
            acquired_at,
            quantity,
            unit_cost,
        }
    }

    /// Create the layer for a purchase.
    #[must_use]
    pub const fn from_purchase(id: LayerId, purchase: &PurchaseEvent) -> Self {
        Self::new(
            id,
            Some(purchase.occurred_at),
            purchase.quantity,
            purchase.unit_cost,
        )
    }

    /// Create the layer for opening stock.
    #[must_use]
    pub const fn opening(stock: &OpeningStock) -> Self {
        Self::new(LayerId::OPENING, None, stock.quantity, stock.unit_cost)
    }

    /// Check if the layer has been fully consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Book value of the units left in this layer.
    #[must_use]
    pub fn value(&self) -> Decimal {
        self.cost_of(self.quantity)
    }

    /// Cost of `units` units at this layer's unit cost.
    #[must_use]
    pub fn cost_of(&self, units: u64) -> Decimal {
        Decimal::from(units) * self.unit_cost
    }

    /// Ordering key: acquisition date, then ingestion order.
    ///
    /// The greatest key is the most recently acquired layer.
    #[must_use]
    pub const fn sort_key(&self) -> (Option<NaiveDate>, LayerId) {
        (self.acquired_at, self.id)
    }

    /// Take up to `units` from this layer and return how many were taken.
    pub fn take(&mut self, units: u64) -> u64 {
        let taken = units.min(self.quantity);
        self.quantity -= taken;
        taken
    }
}

impl fmt::Display for CostLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} @ {}", self.quantity, self.unit_cost)?;
        match self.acquired_at {
            Some(date) => write!(f, ", {date}")?,
            None => write!(f, ", opening")?,
        }
        write!(f, "}}")
    }
}
