//! stockval-report - Value inventory with LIFO cost layers.
//!
//! # Usage
//!
//! ```bash
//! stockval-report --purchases purchases.csv --sales sales.csv summary
//! stockval-report --purchases p.csv --sales s.csv --opening o.csv statement
//! stockval-report --purchases p.csv --sales s.csv --product-column sku --product A-1 layers
//! ```
//!
//! # Reports
//!
//! - `summary` - Totals per product
//! - `statement` - Row-by-row inventory statement with running stock
//! - `layers` - Cost layers still holding stock
//! - `sales` - Cost of goods sold per sale
//!
//! # Exit codes
//!
//! - `0` - Success
//! - `1` - `--strict` was given and a sale outran the available stock
//! - `2` - Input could not be loaded or valued

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use rust_decimal::Decimal;
use stockval_loader::{load_files, ColumnSpec, LoadedLedgers, LoaderConfig};
use stockval_valuation::{valuate_ledger, MarginPolicy};
use tracing_subscriber::EnvFilter;

use crate::render::{self, ProductReport};

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Value inventory from purchase and sale ledgers using LIFO.
#[derive(Parser, Debug)]
#[command(name = "stockval-report")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file of purchases
    #[arg(long, value_name = "FILE")]
    pub purchases: PathBuf,

    /// CSV file of sales
    #[arg(long, value_name = "FILE")]
    pub sales: PathBuf,

    /// CSV file of opening stock
    #[arg(long, value_name = "FILE")]
    pub opening: Option<PathBuf>,

    /// Date format of the input files (strftime-style)
    #[arg(long, value_name = "FORMAT", default_value = "%Y-%m-%d")]
    pub date_format: String,

    /// Field delimiter of the input files
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Column holding the product key (header name or zero-based index)
    #[arg(long, value_name = "COLUMN")]
    pub product_column: Option<ColumnSpec>,

    /// Money uses ',' as the decimal separator
    #[arg(long)]
    pub decimal_comma: bool,

    /// Only report this product
    #[arg(short, long)]
    pub product: Option<String>,

    /// Markup over cost for suggested selling prices, in percent
    #[arg(long, value_name = "PERCENT", default_value = "20")]
    pub margin: Decimal,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Exit with status 1 if any sale outran the available stock
    #[arg(long)]
    pub strict: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The report to generate
    #[command(subcommand)]
    pub report: Report,
}

/// Available reports.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Show totals per product
    Summary,
    /// Show the inventory statement with running stock
    Statement,
    /// Show cost layers still holding stock
    Layers,
    /// Show cost of goods sold per sale
    Sales,
}

impl Args {
    /// Loader configuration described by the arguments.
    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        let mut builder = LoaderConfig::builder()
            .date_format(&self.date_format)
            .delimiter(self.delimiter)
            .decimal_comma(self.decimal_comma);
        if let Some(column) = &self.product_column {
            builder = builder.product_column(column.clone());
        }
        builder.build()
    }
}

/// Main entry point for the report command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();
    let reports = report(args, &mut stdout)?;

    if args.strict && reports.iter().any(|p| p.report.has_oversold()) {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Load, value and render according to `args`, returning the valuations.
pub fn report<W: Write>(args: &Args, writer: &mut W) -> Result<Vec<ProductReport>> {
    tracing::debug!("Loading purchases from {}", args.purchases.display());
    tracing::debug!("Loading sales from {}", args.sales.display());

    let mut loaded = load_files(
        &args.loader_config(),
        &args.purchases,
        &args.sales,
        args.opening.as_deref(),
    )
    .context("failed to load ledgers")?;

    if let Some(product) = &args.product {
        loaded = loaded.retain_product(product);
        if loaded.is_empty() {
            anyhow::bail!("product not found: {product}");
        }
    }

    let reports = valuate_all(loaded)?;
    for product in &reports {
        if product.report.has_oversold() {
            tracing::warn!(
                "{}: {} unit(s) sold beyond available stock",
                product.product,
                product.report.oversold_quantity
            );
        }
    }

    let margin = MarginPolicy::new(args.margin);
    match (args.report, args.format) {
        (Report::Summary, OutputFormat::Text) => render::write_summary(&reports, writer)?,
        (Report::Summary, OutputFormat::Json) => render::write_summary_json(&reports, writer)?,
        (Report::Statement, OutputFormat::Text) => {
            render::write_statement(&reports, &margin, writer)?;
        }
        (Report::Statement, OutputFormat::Json) => {
            render::write_statement_json(&reports, &margin, writer)?;
        }
        (Report::Layers, OutputFormat::Text) => render::write_layers(&reports, writer)?,
        (Report::Layers, OutputFormat::Json) => render::write_layers_json(&reports, writer)?,
        (Report::Sales, OutputFormat::Text) => render::write_sales(&reports, writer)?,
        (Report::Sales, OutputFormat::Json) => render::write_sales_json(&reports, writer)?,
    }

    Ok(reports)
}

/// Value every product's ledger in parallel, keeping product order.
pub fn valuate_all(loaded: LoadedLedgers) -> Result<Vec<ProductReport>> {
    let ledgers: Vec<_> = loaded.into_iter().collect();
    ledgers
        .into_par_iter()
        .map(|(product, ledger)| {
            let report = valuate_ledger(&ledger)
                .with_context(|| format!("failed to value product '{product}'"))?;
            Ok(ProductReport {
                product,
                ledger,
                report,
            })
        })
        .collect()
}
