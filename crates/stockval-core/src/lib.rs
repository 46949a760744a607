//! Core types for stockval
//!
//! This crate provides the value types the valuation engine works on:
//!
//! - [`PurchaseEvent`] - Stock received at a per-unit cost
//! - [`SaleEvent`] - Stock sold, by quantity
//! - [`OpeningStock`] - Inventory that existed before the ledger window
//! - [`Ledger`] - One product's purchases, sales and opening stock
//! - [`CostLayer`] - Unconsumed quantity from one purchase batch
//! - [`LayerStack`] - The ordered set of layers a sale draws from (newest first)
//!
//! # Example
//!
//! ```
//! use stockval_core::{LayerStack, PurchaseEvent};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let purchases = [
//!     PurchaseEvent::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 5, dec!(10)),
//!     PurchaseEvent::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 3, dec!(20)),
//! ];
//! let mut stack = LayerStack::from_ledger(&purchases, None);
//!
//! // The newest layer is drained first, then the sale spills into the older one.
//! let drawn = stack.draw_lifo(4);
//! assert_eq!(drawn.cost, dec!(70)); // 3 * 20 + 1 * 10
//! assert_eq!(stack.quantity(), 4);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod event;
pub mod layer;
pub mod stack;

pub use event::{
    validate_events, EventKind, Ledger, OpeningStock, PurchaseEvent, SaleEvent, ValidationError,
};
pub use layer::{CostLayer, LayerId};
pub use stack::{Draw, DrawResult, LayerStack};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
