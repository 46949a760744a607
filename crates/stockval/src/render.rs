//! Text and JSON rendering of valuation results.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use stockval_core::{CostLayer, Ledger};
use stockval_valuation::{
    LedgerTotals, MarginPolicy, RowKind, SaleResult, Statement, StatementRow, ValuationReport,
};

/// One product's ledger with its valuation.
#[derive(Debug, Clone)]
pub struct ProductReport {
    /// Product key
    pub product: String,
    /// The valuated ledger
    pub ledger: Ledger,
    /// The valuation result
    pub report: ValuationReport,
}

/// Format money to two decimal places, rounding half away from zero.
#[must_use]
pub fn money(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

fn cell<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn money_cell(value: Option<Decimal>) -> String {
    cell(value.map(money))
}

fn percent_cell(value: Option<Decimal>) -> String {
    cell(value.map(|p| format!("{}%", money(p))))
}

fn heading<W: Write>(writer: &mut W, title: &str, product: &str) -> Result<()> {
    writeln!(writer, "{title}: {product}")?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer)?;
    Ok(())
}

/// Write the totals of each product.
pub fn write_summary<W: Write>(reports: &[ProductReport], writer: &mut W) -> Result<()> {
    for (i, product) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        heading(writer, "Inventory Summary", &product.product)?;
        let totals = &product.report.totals;

        writeln!(
            writer,
            "  Opening stock:      {:>10}  {:>15}",
            totals.opening_quantity,
            money(totals.opening_value)
        )?;
        writeln!(
            writer,
            "  Purchases:          {:>10}  {:>15}",
            totals.purchase_quantity,
            money(totals.purchase_amount)
        )?;
        writeln!(
            writer,
            "  Sales:              {:>10}  {:>15}",
            totals.sale_quantity,
            money(totals.sale_amount)
        )?;
        writeln!(
            writer,
            "  Cost of goods sold: {:>10}  {:>15}",
            totals.satisfied_quantity,
            money(totals.cost_of_goods_sold)
        )?;
        writeln!(
            writer,
            "  Gross profit:       {:>10}  {:>15}",
            "",
            money(totals.gross_profit())
        )?;
        writeln!(
            writer,
            "  Remaining stock:    {:>10}  {:>15}",
            totals.remaining_quantity,
            money(totals.remaining_value)
        )?;
        if product.report.has_oversold() {
            writeln!(
                writer,
                "  Oversold units:     {:>10}",
                product.report.oversold_quantity
            )?;
        }
    }
    Ok(())
}

/// Write the inventory statement of each product.
pub fn write_statement<W: Write>(
    reports: &[ProductReport],
    margin: &MarginPolicy,
    writer: &mut W,
) -> Result<()> {
    for (i, product) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        heading(writer, "Inventory Statement", &product.product)?;
        let statement = Statement::build(&product.ledger, &product.report, margin);

        writeln!(
            writer,
            "{:<10} {:>6} {:>12} {:>14} {:>6} {:>12} {:>14} {:>7} {:>14} {:>12} {:>14} {:>9}",
            "Date",
            "In",
            "Unit cost",
            "Purchased",
            "Out",
            "Unit price",
            "Sold",
            "Stock",
            "COGS",
            "Suggested",
            "Profit",
            "Profit %"
        )?;
        for row in &statement.rows {
            write_statement_row(row, writer)?;
        }
        write_statement_totals(&statement.totals, writer)?;
    }
    Ok(())
}

fn write_statement_row<W: Write>(row: &StatementRow, writer: &mut W) -> Result<()> {
    let date = match row.kind {
        RowKind::Opening => "opening".to_string(),
        RowKind::Purchase | RowKind::Sale => cell(row.date),
    };
    writeln!(
        writer,
        "{:<10} {:>6} {:>12} {:>14} {:>6} {:>12} {:>14} {:>7} {:>14} {:>12} {:>14} {:>9}",
        date,
        cell(row.purchase_quantity),
        money_cell(row.purchase_unit_cost),
        money_cell(row.purchase_total),
        cell(row.sale_quantity),
        money_cell(row.sale_unit_price),
        money_cell(row.sale_total),
        row.stock,
        money_cell(row.cogs),
        money_cell(row.suggested_unit_price),
        money_cell(row.gross_profit),
        percent_cell(row.margin_percent),
    )?;
    Ok(())
}

fn write_statement_totals<W: Write>(totals: &LedgerTotals, writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", "-".repeat(60))?;
    writeln!(
        writer,
        "{:<10} {:>6} {:>12} {:>14} {:>6} {:>12} {:>14} {:>7} {:>14} {:>12} {:>14}",
        "Total",
        totals.purchase_quantity,
        "",
        money(totals.purchase_amount),
        totals.sale_quantity,
        "",
        money(totals.sale_amount),
        totals.remaining_quantity,
        money(totals.cost_of_goods_sold),
        "",
        money(totals.gross_profit()),
    )?;
    Ok(())
}

/// Write the cost layers each product still holds, most recent first.
pub fn write_layers<W: Write>(reports: &[ProductReport], writer: &mut W) -> Result<()> {
    for (i, product) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        heading(writer, "Remaining Layers", &product.product)?;

        if product.report.remaining_layers.is_empty() {
            writeln!(writer, "No stock on hand.")?;
            continue;
        }
        for layer in &product.report.remaining_layers {
            write_layer(layer, writer)?;
        }
        writeln!(
            writer,
            "  {:<8} {:<10} {:>8} {:>12} {:>15}",
            "Total",
            "",
            product.report.remaining_quantity,
            "",
            money(product.report.remaining_value)
        )?;
    }
    Ok(())
}

fn write_layer<W: Write>(layer: &CostLayer, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "  {:<8} {:<10} {:>8} {:>12} {:>15}",
        layer.id.to_string(),
        cell(layer.acquired_at),
        layer.quantity,
        money(layer.unit_cost),
        money(layer.value())
    )?;
    Ok(())
}

/// Write each sale's cost and the layers it drew from.
pub fn write_sales<W: Write>(reports: &[ProductReport], writer: &mut W) -> Result<()> {
    for (i, product) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        heading(writer, "Cost of Goods Sold", &product.product)?;

        if product.report.sales.is_empty() {
            writeln!(writer, "No sales.")?;
            continue;
        }
        for sale in &product.report.sales {
            write_sale(sale, writer)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total COGS: {}", money(product.report.total_cogs))?;
    }
    Ok(())
}

fn write_sale<W: Write>(sale: &SaleResult, writer: &mut W) -> Result<()> {
    write!(
        writer,
        "{}  sold {:>6}  COGS {:>14}",
        sale.occurred_at,
        sale.quantity,
        money(sale.cost_of_goods_sold)
    )?;
    if sale.is_oversold() {
        write!(writer, "  ({} unit(s) oversold)", sale.unsatisfied)?;
    }
    writeln!(writer)?;

    for draw in &sale.layers_consumed {
        writeln!(
            writer,
            "    from layer {:<8} {:>10} {:>6} @ {:>12} = {:>14}",
            draw.layer.to_string(),
            cell(draw.acquired_at),
            draw.quantity,
            money(draw.unit_cost),
            money(draw.cost())
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    product: &'a str,
    total_cogs: Decimal,
    gross_profit: Decimal,
    oversold_quantity: u64,
    totals: &'a LedgerTotals,
}

#[derive(Serialize)]
struct StatementJson<'a> {
    product: &'a str,
    #[serde(flatten)]
    statement: Statement,
}

#[derive(Serialize)]
struct LayersJson<'a> {
    product: &'a str,
    remaining_quantity: u64,
    remaining_value: Decimal,
    remaining_layers: &'a [CostLayer],
}

#[derive(Serialize)]
struct SalesJson<'a> {
    product: &'a str,
    total_cogs: Decimal,
    sales: &'a [SaleResult],
}

fn write_json<W: Write, T: Serialize>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Write the totals of each product as JSON.
pub fn write_summary_json<W: Write>(reports: &[ProductReport], writer: &mut W) -> Result<()> {
    let items: Vec<_> = reports
        .iter()
        .map(|p| SummaryJson {
            product: &p.product,
            total_cogs: p.report.total_cogs,
            gross_profit: p.report.totals.gross_profit(),
            oversold_quantity: p.report.oversold_quantity,
            totals: &p.report.totals,
        })
        .collect();
    write_json(&items, writer)
}

/// Write the inventory statement of each product as JSON.
pub fn write_statement_json<W: Write>(
    reports: &[ProductReport],
    margin: &MarginPolicy,
    writer: &mut W,
) -> Result<()> {
    let items: Vec<_> = reports
        .iter()
        .map(|p| StatementJson {
            product: &p.product,
            statement: Statement::build(&p.ledger, &p.report, margin),
        })
        .collect();
    write_json(&items, writer)
}

/// Write the remaining cost layers of each product as JSON.
pub fn write_layers_json<W: Write>(reports: &[ProductReport], writer: &mut W) -> Result<()> {
    let items: Vec<_> = reports
        .iter()
        .map(|p| LayersJson {
            product: &p.product,
            remaining_quantity: p.report.remaining_quantity,
            remaining_value: p.report.remaining_value,
            remaining_layers: &p.report.remaining_layers,
        })
        .collect();
    write_json(&items, writer)
}

/// Write each product's per-sale costs as JSON.
pub fn write_sales_json<W: Write>(reports: &[ProductReport], writer: &mut W) -> Result<()> {
    let items: Vec<_> = reports
        .iter()
        .map(|p| SalesJson {
            product: &p.product,
            total_cogs: p.report.total_cogs,
            sales: &p.report.sales,
        })
        .collect();
    write_json(&items, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use stockval_core::{OpeningStock, PurchaseEvent, SaleEvent};
    use stockval_valuation::valuate_ledger;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample() -> Vec<ProductReport> {
        let ledger = Ledger::new()
            .with_opening(OpeningStock::new(2, dec!(8)))
            .with_purchase(PurchaseEvent::new(date(1), 5, dec!(10)))
            .with_purchase(PurchaseEvent::new(date(2), 3, dec!(20)))
            .with_sale(SaleEvent::new(date(3), 4).with_unit_price(dec!(25)));
        let report = valuate_ledger(&ledger).unwrap();
        vec![ProductReport {
            product: "widget".to_string(),
            ledger,
            report,
        }]
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_money_rounding() {
        assert_eq!(money(dec!(70)), "70.00");
        assert_eq!(money(dec!(2.345)), "2.35");
        assert_eq!(money(dec!(-2.345)), "-2.35");
        assert_eq!(money(dec!(1.5)), "1.50");
    }

    #[test]
    fn test_summary_text() {
        let reports = sample();
        let text = render(|w| write_summary(&reports, w));
        assert!(text.starts_with("Inventory Summary: widget\n"));
        assert!(text.contains("70.00"));
        assert!(text.contains("Remaining stock:"));
        assert!(!text.contains("Oversold"));
    }

    #[test]
    fn test_statement_text_has_rows_and_totals() {
        let reports = sample();
        let text = render(|w| write_statement(&reports, &MarginPolicy::default(), w));
        assert!(text.contains("opening"));
        assert!(text.contains("2024-01-03"));
        assert!(text.contains("Total"));
        // 70 / 4 = 17.50 average, plus 20%
        assert!(text.contains("21.00"));
    }

    #[test]
    fn test_statement_text_shows_profit() {
        let reports = sample();
        let text = render(|w| write_statement(&reports, &MarginPolicy::default(), w));
        let header = text.lines().find(|l| l.starts_with("Date")).unwrap();
        assert!(header.ends_with("Profit  Profit %"));

        // 4 * 25 = 100 revenue against 70 COGS
        let sale = text.lines().find(|l| l.starts_with("2024-01-03")).unwrap();
        assert!(sale.ends_with("30.00    30.00%"));
        let total = text.lines().find(|l| l.starts_with("Total")).unwrap();
        assert!(total.ends_with("30.00"));
    }

    #[test]
    fn test_layers_and_sales_text() {
        let reports = sample();
        let layers = render(|w| write_layers(&reports, w));
        assert!(layers.contains("#1"));
        assert!(layers.contains("opening"));

        let sales = render(|w| write_sales(&reports, w));
        assert!(sales.contains("from layer #2"));
        assert!(sales.contains("Total COGS: 70.00"));
    }

    #[test]
    fn test_summary_json() {
        let reports = sample();
        let text = render(|w| write_summary_json(&reports, w));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["product"], "widget");
        assert_eq!(value[0]["totals"]["remaining_quantity"], 6);
    }

    #[test]
    fn test_statement_json_is_flattened() {
        let reports = sample();
        let text = render(|w| write_statement_json(&reports, &MarginPolicy::default(), w));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["rows"].as_array().unwrap().len(), 4);
        assert_eq!(value[0]["rows"][0]["kind"], "Opening");
    }
}
