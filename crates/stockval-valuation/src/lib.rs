//! LIFO inventory valuation.
//!
//! This crate provides:
//! - The valuation engine ([`valuate`]): cost of goods sold per sale, drawing
//!   the most recently acquired stock first
//! - The report assembler ([`LedgerTotals`]): purchase, sale, COGS and
//!   remaining-stock totals
//! - The inventory statement ([`Statement`]): the row-by-row stock card with
//!   running stock, per-sale COGS and profit columns
//!
//! # Example
//!
//! ```
//! use stockval_core::{Ledger, PurchaseEvent, SaleEvent};
//! use stockval_valuation::valuate_ledger;
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let ledger = Ledger::new()
//!     .with_purchase(PurchaseEvent::new(day(1), 5, dec!(10)))
//!     .with_purchase(PurchaseEvent::new(day(2), 3, dec!(20)))
//!     .with_sale(SaleEvent::new(day(3), 4));
//!
//! let report = valuate_ledger(&ledger).unwrap();
//! assert_eq!(report.total_cogs, dec!(70)); // 3 * 20 + 1 * 10
//! assert_eq!(report.remaining_quantity, 4);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod margin;
mod report;
mod statement;
mod totals;

pub use engine::{valuate, valuate_ledger, ValuationError};
pub use margin::MarginPolicy;
pub use report::{SaleResult, ValuationReport};
pub use statement::{RowKind, Statement, StatementRow};
pub use totals::LedgerTotals;
