//! Ledger loader for stockval.
//!
//! This crate turns external records into the event types the valuation
//! engine consumes. It performs no costing itself: it reads purchase, sale and
//! opening-stock rows, converts their fields, groups them by product and puts
//! them in the order the engine expects (purchases oldest first, sales newest
//! first). Loading stops at the first malformed row.
//!
//! # Example
//!
//! ```rust
//! use stockval_loader::{load_strings, LoaderConfig, DEFAULT_PRODUCT};
//!
//! let purchases = "date,quantity,unit_cost\n2024-01-01,5,10\n2024-01-02,3,20\n";
//! let sales = "date,quantity,unit_price\n2024-01-03,4,25\n";
//!
//! let loaded = load_strings(&LoaderConfig::default(), purchases, sales, None).unwrap();
//! let ledger = loaded.get(DEFAULT_PRODUCT).unwrap();
//! assert_eq!(ledger.purchases.len(), 2);
//! assert_eq!(ledger.sales.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod csv_loader;
pub mod fields;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use stockval_core::Ledger;
use thiserror::Error;

pub use config::{ColumnSpec, CsvConfig, LoaderConfig, LoaderConfigBuilder};
pub use csv_loader::CsvLoader;
pub use fields::{
    opening_from_fields, parse_money, purchase_from_fields, sale_from_fields, DecimalSeparator,
    Field, FieldError, FieldFormat,
};

/// Product key used when rows carry no product column.
pub const DEFAULT_PRODUCT: &str = "default";

/// Errors that can occur during loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// IO error reading a file.
    #[error("failed to read file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The CSV itself is unreadable.
    #[error("{file}: {source}")]
    Csv {
        /// Name of the source.
        file: String,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// The configured delimiter is not a single-byte character.
    #[error("{file}: delimiter '{delimiter}' is not an ASCII character")]
    InvalidDelimiter {
        /// Name of the source.
        file: String,
        /// The configured delimiter.
        delimiter: char,
    },

    /// A required column is not in the header.
    #[error("{file}: column '{column}' not found in header")]
    MissingColumn {
        /// Name of the source.
        file: String,
        /// The configured column name.
        column: String,
    },

    /// A row has a missing or malformed field.
    #[error("{file}, row {row}: {source}")]
    Row {
        /// Name of the source.
        file: String,
        /// 1-based line number of the row.
        row: u64,
        /// What is wrong with the row.
        #[source]
        source: FieldError,
    },

    /// A product has more than one opening-stock row.
    #[error("{file}, row {row}: duplicate opening stock for product '{product}'")]
    DuplicateOpening {
        /// Name of the source.
        file: String,
        /// 1-based line number of the second row.
        row: u64,
        /// The product key.
        product: String,
    },
}

impl LoadError {
    /// Line number of the offending row, when the error is tied to one.
    #[must_use]
    pub const fn row(&self) -> Option<u64> {
        match self {
            Self::Row { row, .. } | Self::DuplicateOpening { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// The field error behind a row error.
    #[must_use]
    pub const fn field_error(&self) -> Option<&FieldError> {
        match self {
            Self::Row { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Ledgers keyed by product, ready for valuation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedLedgers {
    /// One ledger per product key, in key order.
    pub ledgers: BTreeMap<String, Ledger>,
}

impl LoadedLedgers {
    /// The ledger for one product.
    #[must_use]
    pub fn get(&self, product: &str) -> Option<&Ledger> {
        self.ledgers.get(product)
    }

    /// Product keys in order.
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.ledgers.keys().map(String::as_str)
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    /// Check if nothing was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }

    /// Keep only the given product.
    #[must_use]
    pub fn retain_product(mut self, product: &str) -> Self {
        self.ledgers.retain(|key, _| key == product);
        self
    }
}

impl IntoIterator for LoadedLedgers {
    type Item = (String, Ledger);
    type IntoIter = std::collections::btree_map::IntoIter<String, Ledger>;

    fn into_iter(self) -> Self::IntoIter {
        self.ledgers.into_iter()
    }
}

/// Load ledgers from files using the given configuration.
pub fn load_files(
    config: &LoaderConfig,
    purchases: &Path,
    sales: &Path,
    opening: Option<&Path>,
) -> Result<LoadedLedgers, LoadError> {
    CsvLoader::new(config.clone()).load_files(purchases, sales, opening)
}

/// Load ledgers from file contents (useful for testing).
pub fn load_strings(
    config: &LoaderConfig,
    purchases: &str,
    sales: &str,
    opening: Option<&str>,
) -> Result<LoadedLedgers, LoadError> {
    CsvLoader::new(config.clone()).load_strings(purchases, sales, opening)
}
