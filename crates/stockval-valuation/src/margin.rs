//! Markup-based selling prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Suggested selling price as a percentage markup over unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarginPolicy {
    /// Markup in percent (20 means cost + 20%)
    pub percent: Decimal,
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self {
            percent: Decimal::from(20),
        }
    }
}

impl MarginPolicy {
    /// Create a policy with the given markup percentage.
    #[must_use]
    pub const fn new(percent: Decimal) -> Self {
        Self { percent }
    }

    /// Selling price for a unit bought at `unit_cost`, or `None` if the
    /// markup overflows.
    #[must_use]
    pub fn selling_price(&self, unit_cost: Decimal) -> Option<Decimal> {
        let markup = unit_cost
            .checked_mul(self.percent)?
            .checked_div(Decimal::ONE_HUNDRED)?;
        unit_cost.checked_add(markup)
    }
}
