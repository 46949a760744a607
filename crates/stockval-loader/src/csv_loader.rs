//! CSV ledger loader.

use std::collections::btree_map::Entry;
use std::collections::HashMap;
use std::path::Path;

use stockval_core::{OpeningStock, PurchaseEvent, SaleEvent};

use crate::config::{ColumnSpec, CsvConfig, LoaderConfig};
use crate::fields::{opening_from_fields, purchase_from_fields, sale_from_fields, FieldError};
use crate::{LoadError, LoadedLedgers, DEFAULT_PRODUCT};

/// A converted row together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedRow<T> {
    /// Product key of the row.
    pub product: String,
    /// 1-based line number.
    pub line: u64,
    /// The converted event.
    pub value: T,
}

/// Raw field text of one record.
#[derive(Debug)]
struct RawFields<'a> {
    date: Option<&'a str>,
    quantity: Option<&'a str>,
    price: Option<&'a str>,
    product: Option<&'a str>,
}

/// Column indexes resolved against a header.
#[derive(Debug)]
struct Columns {
    date: Option<usize>,
    quantity: usize,
    price: Option<usize>,
    product: Option<usize>,
}

/// Reads purchase, sale and opening-stock CSV files.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    config: LoaderConfig,
}

impl CsvLoader {
    /// Create a new CSV loader with the given configuration.
    #[must_use]
    pub const fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The loader's configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load ledgers from files.
    pub fn load_files(
        &self,
        purchases: &Path,
        sales: &Path,
        opening: Option<&Path>,
    ) -> Result<LoadedLedgers, LoadError> {
        let purchases_text = read_file(purchases)?;
        let sales_text = read_file(sales)?;
        let opening_text = opening.map(read_file).transpose()?;

        let purchases_name = purchases.display().to_string();
        let sales_name = sales.display().to_string();
        let opening_name = opening.map(|p| p.display().to_string());

        self.load_named(
            (&purchases_name, &purchases_text),
            (&sales_name, &sales_text),
            opening_name.as_deref().zip(opening_text.as_deref()),
        )
    }

    /// Load ledgers from file contents.
    pub fn load_strings(
        &self,
        purchases: &str,
        sales: &str,
        opening: Option<&str>,
    ) -> Result<LoadedLedgers, LoadError> {
        self.load_named(
            ("purchases", purchases),
            ("sales", sales),
            opening.map(|text| ("opening", text)),
        )
    }

    fn load_named(
        &self,
        purchases: (&str, &str),
        sales: (&str, &str),
        opening: Option<(&str, &str)>,
    ) -> Result<LoadedLedgers, LoadError> {
        let purchases = self.read_purchases(purchases.0, purchases.1)?;
        let sales = self.read_sales(sales.0, sales.1)?;
        let opening = match opening {
            Some((name, text)) => Some((name, self.read_opening(name, text)?)),
            None => None,
        };

        let loaded = group_by_product(purchases, sales, opening)?;
        tracing::info!(
            "Loaded {} product ledger(s): {} purchase(s), {} sale(s)",
            loaded.len(),
            loaded.ledgers.values().map(|l| l.purchases.len()).sum::<usize>(),
            loaded.ledgers.values().map(|l| l.sales.len()).sum::<usize>(),
        );
        Ok(loaded)
    }

    /// Read purchase rows from CSV content.
    pub fn read_purchases(
        &self,
        name: &str,
        content: &str,
    ) -> Result<Vec<LoadedRow<PurchaseEvent>>, LoadError> {
        let format = &self.config.format;
        let rows = read_rows(name, content, &self.config.purchases, true, |raw| {
            purchase_from_fields(raw.date, raw.quantity, raw.price, format)
        })?;
        tracing::debug!("Read {} purchase row(s) from {}", rows.len(), name);
        Ok(rows)
    }

    /// Read sale rows from CSV content. The price column is optional.
    pub fn read_sales(
        &self,
        name: &str,
        content: &str,
    ) -> Result<Vec<LoadedRow<SaleEvent>>, LoadError> {
        let format = &self.config.format;
        let rows = read_rows(name, content, &self.config.sales, false, |raw| {
            sale_from_fields(raw.date, raw.quantity, raw.price, format)
        })?;
        tracing::debug!("Read {} sale row(s) from {}", rows.len(), name);
        Ok(rows)
    }

    /// Read opening-stock rows from CSV content.
    pub fn read_opening(
        &self,
        name: &str,
        content: &str,
    ) -> Result<Vec<LoadedRow<OpeningStock>>, LoadError> {
        let format = &self.config.format;
        let rows = read_rows(name, content, &self.config.opening, true, |raw| {
            opening_from_fields(raw.quantity, raw.price, format)
        })?;
        tracing::debug!("Read {} opening-stock row(s) from {}", rows.len(), name);
        Ok(rows)
    }
}

fn read_file(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_rows<T>(
    name: &str,
    content: &str,
    csv_config: &CsvConfig,
    price_required: bool,
    mut convert: impl FnMut(&RawFields<'_>) -> Result<T, FieldError>,
) -> Result<Vec<LoadedRow<T>>, LoadError> {
    let delimiter = u8::try_from(csv_config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| LoadError::InvalidDelimiter {
            file: name.to_string(),
            delimiter: csv_config.delimiter,
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(csv_config.has_header)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let csv_error = |source| LoadError::Csv {
        file: name.to_string(),
        source,
    };

    // Build column name to index map from headers
    let header_map: HashMap<String, usize> = if csv_config.has_header {
        reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_ascii_lowercase(), i))
            .collect()
    } else {
        HashMap::new()
    };
    let columns = resolve_columns(name, csv_config, &header_map, price_required)?;

    let mut rows = Vec::new();
    let first_line = u64::from(csv_config.has_header) + 1;
    for (index, result) in reader.records().enumerate().skip(csv_config.skip_rows) {
        let record = result.map_err(csv_error)?;
        let line = record
            .position()
            .map_or(first_line + index as u64, csv::Position::line);

        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |column: Option<usize>| column.and_then(|i| record.get(i));
        let raw = RawFields {
            date: field(columns.date),
            quantity: field(Some(columns.quantity)),
            price: field(columns.price),
            product: field(columns.product),
        };

        let value = convert(&raw).map_err(|source| LoadError::Row {
            file: name.to_string(),
            row: line,
            source,
        })?;
        let product = raw
            .product
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PRODUCT)
            .to_string();

        rows.push(LoadedRow {
            product,
            line,
            value,
        });
    }

    Ok(rows)
}

fn resolve_columns(
    name: &str,
    csv_config: &CsvConfig,
    header_map: &HashMap<String, usize>,
    price_required: bool,
) -> Result<Columns, LoadError> {
    let lookup = |spec: &ColumnSpec| match spec {
        ColumnSpec::Index(i) => Some(*i),
        ColumnSpec::Name(column) => header_map.get(&column.to_ascii_lowercase()).copied(),
    };
    let required = |spec: &ColumnSpec| {
        lookup(spec).ok_or_else(|| LoadError::MissingColumn {
            file: name.to_string(),
            column: match spec {
                ColumnSpec::Name(column) => column.clone(),
                ColumnSpec::Index(i) => i.to_string(),
            },
        })
    };

    let date = csv_config.date_column.as_ref().map(required).transpose()?;
    let quantity = required(&csv_config.quantity_column)?;
    let price = if price_required {
        Some(required(&csv_config.price_column)?)
    } else {
        lookup(&csv_config.price_column)
    };

    let product = csv_config.product_column.as_ref().and_then(|spec| {
        let found = lookup(spec);
        if found.is_none() {
            tracing::warn!(
                "{}: product column {:?} not found, using '{}'",
                name,
                spec,
                DEFAULT_PRODUCT
            );
        }
        found
    });

    Ok(Columns {
        date,
        quantity,
        price,
        product,
    })
}

fn group_by_product(
    purchases: Vec<LoadedRow<PurchaseEvent>>,
    sales: Vec<LoadedRow<SaleEvent>>,
    opening: Option<(&str, Vec<LoadedRow<OpeningStock>>)>,
) -> Result<LoadedLedgers, LoadError> {
    let mut loaded = LoadedLedgers::default();

    if let Some((name, rows)) = opening {
        for row in rows {
            match loaded.ledgers.entry(row.product) {
                Entry::Occupied(entry) if entry.get().opening.is_some() => {
                    return Err(LoadError::DuplicateOpening {
                        file: name.to_string(),
                        row: row.line,
                        product: entry.key().clone(),
                    });
                }
                entry => entry.or_default().opening = Some(row.value),
            }
        }
    }

    for row in purchases {
        loaded.ledgers.entry(row.product).or_default().purchases.push(row.value);
    }
    for row in sales {
        loaded.ledgers.entry(row.product).or_default().sales.push(row.value);
    }

    for ledger in loaded.ledgers.values_mut() {
        ledger.purchases.sort_by_key(|p| p.occurred_at);
        ledger.sales.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    }

    Ok(loaded)
}
