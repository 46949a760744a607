//! Inventory valuation CLI tools.
//!
//! This crate provides the `stockval-report` command, which loads purchase,
//! sale and opening-stock CSV files, values each product's stock with LIFO
//! cost layers, and prints the result:
//!
//! - `summary`: totals per product
//! - `statement`: the row-by-row inventory statement
//! - `layers`: cost layers still holding stock
//! - `sales`: cost of goods sold per sale, with the layers drawn
//!
//! # Example Usage
//!
//! ```bash
//! stockval-report --purchases purchases.csv --sales sales.csv summary
//! stockval-report --purchases p.csv --sales s.csv --opening o.csv --format json statement
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod render;
