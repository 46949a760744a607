//! Configuration for the CSV loader.

use std::convert::Infallible;
use std::str::FromStr;

use crate::fields::{DecimalSeparator, FieldFormat};

/// Specification for a column in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnSpec {
    /// Column specified by name (from header).
    Name(String),
    /// Column specified by zero-based index.
    Index(usize),
}

impl ColumnSpec {
    /// Column specified by name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl FromStr for ColumnSpec {
    type Err = Infallible;

    /// All-digit input is an index, anything else a header name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<usize>()
            .map_or_else(|_| Self::Name(s.to_string()), Self::Index))
    }
}

/// Column layout of one CSV file.
///
/// `price_column` is the unit cost for purchase and opening-stock files and
/// the unit price for sale files. Opening-stock files have no date column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvConfig {
    /// The column for the event date.
    pub date_column: Option<ColumnSpec>,
    /// The column for the number of units.
    pub quantity_column: ColumnSpec,
    /// The column for the unit cost or price.
    pub price_column: ColumnSpec,
    /// The column naming the product (all rows share one product if unset).
    pub product_column: Option<ColumnSpec>,
    /// Whether the CSV has a header row.
    pub has_header: bool,
    /// The field delimiter.
    pub delimiter: char,
    /// Number of data rows to skip at the beginning.
    pub skip_rows: usize,
}

impl CsvConfig {
    fn base(date_column: Option<&str>, price_column: &str) -> Self {
        Self {
            date_column: date_column.map(ColumnSpec::name),
            quantity_column: ColumnSpec::name("quantity"),
            price_column: ColumnSpec::name(price_column),
            product_column: None,
            has_header: true,
            delimiter: ',',
            skip_rows: 0,
        }
    }

    /// Default layout of a purchase file: `date,quantity,unit_cost`.
    #[must_use]
    pub fn purchases() -> Self {
        Self::base(Some("date"), "unit_cost")
    }

    /// Default layout of a sale file: `date,quantity,unit_price`.
    #[must_use]
    pub fn sales() -> Self {
        Self::base(Some("date"), "unit_price")
    }

    /// Default layout of an opening-stock file: `quantity,unit_cost`.
    #[must_use]
    pub fn opening() -> Self {
        Self::base(None, "unit_cost")
    }

    /// Set the date column.
    #[must_use]
    pub fn with_date_column(mut self, column: ColumnSpec) -> Self {
        self.date_column = Some(column);
        self
    }

    /// Set the quantity column.
    #[must_use]
    pub fn with_quantity_column(mut self, column: ColumnSpec) -> Self {
        self.quantity_column = column;
        self
    }

    /// Set the unit cost or price column.
    #[must_use]
    pub fn with_price_column(mut self, column: ColumnSpec) -> Self {
        self.price_column = column;
        self
    }

    /// Set the product column.
    #[must_use]
    pub fn with_product_column(mut self, column: ColumnSpec) -> Self {
        self.product_column = Some(column);
        self
    }

    /// Set whether the CSV has a header row.
    #[must_use]
    pub const fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the number of data rows to skip.
    #[must_use]
    pub const fn with_skip_rows(mut self, count: usize) -> Self {
        self.skip_rows = count;
        self
    }
}

/// Configuration for loading a full set of ledger files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Layout of the purchase file.
    pub purchases: CsvConfig,
    /// Layout of the sale file.
    pub sales: CsvConfig,
    /// Layout of the opening-stock file.
    pub opening: CsvConfig,
    /// Date and number formats shared by all files.
    pub format: FieldFormat,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            purchases: CsvConfig::purchases(),
            sales: CsvConfig::sales(),
            opening: CsvConfig::opening(),
            format: FieldFormat::default(),
        }
    }
}

impl LoaderConfig {
    /// Start building a loader configuration.
    #[must_use]
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder::new()
    }

    fn files_mut(&mut self) -> [&mut CsvConfig; 3] {
        [&mut self.purchases, &mut self.sales, &mut self.opening]
    }
}

/// Builder for [`LoaderConfig`].
///
/// The shared setters apply to all three files; use [`Self::purchases`],
/// [`Self::sales`] or [`Self::opening`] to replace one file's layout.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    /// Create a new builder with the default layouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the date format (strftime-style).
    #[must_use]
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.format.date_format = format.into();
        self
    }

    /// Use `,` as the decimal separator for money.
    #[must_use]
    pub const fn decimal_comma(mut self, enabled: bool) -> Self {
        self.config.format.decimal_separator = if enabled {
            DecimalSeparator::Comma
        } else {
            DecimalSeparator::Dot
        };
        self
    }

    /// Set the field delimiter of every file.
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        for file in self.config.files_mut() {
            file.delimiter = delimiter;
        }
        self
    }

    /// Set whether every file has a header row.
    #[must_use]
    pub fn has_header(mut self, has_header: bool) -> Self {
        for file in self.config.files_mut() {
            file.has_header = has_header;
        }
        self
    }

    /// Group rows by the given product column in every file.
    #[must_use]
    pub fn product_column(mut self, column: ColumnSpec) -> Self {
        for file in self.config.files_mut() {
            file.product_column = Some(column.clone());
        }
        self
    }

    /// Replace the purchase file layout.
    #[must_use]
    pub fn purchases(mut self, config: CsvConfig) -> Self {
        self.config.purchases = config;
        self
    }

    /// Replace the sale file layout.
    #[must_use]
    pub fn sales(mut self, config: CsvConfig) -> Self {
        self.config.sales = config;
        self
    }

    /// Replace the opening-stock file layout.
    #[must_use]
    pub fn opening(mut self, config: CsvConfig) -> Self {
        self.config.opening = config;
        self
    }

    /// Build the loader configuration.
    #[must_use]
    pub fn build(self) -> LoaderConfig {
        self.config
    }
}
