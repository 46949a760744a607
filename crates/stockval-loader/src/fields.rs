//! Field-level conversion from raw text into events.
//!
//! Every function here takes the raw, possibly absent, text of each field and
//! either builds the event or reports the first field that is wrong. Nothing
//! here knows about files or rows; [`crate::csv_loader`] adds that context.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use stockval_core::{OpeningStock, PurchaseEvent, SaleEvent};
use thiserror::Error;

/// A field of an input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Event date
    Date,
    /// Number of units
    Quantity,
    /// Cost per unit (purchases and opening stock)
    UnitCost,
    /// Price per unit (sales)
    UnitPrice,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Date => "date",
            Self::Quantity => "quantity",
            Self::UnitCost => "unit cost",
            Self::UnitPrice => "unit price",
        })
    }
}

/// Why a field could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A required field is absent or blank.
    #[error("missing {0}")]
    MissingField(Field),

    /// A numeric field does not hold a number.
    #[error("invalid {field} '{value}'")]
    InvalidNumber {
        /// The offending field.
        field: Field,
        /// The raw text.
        value: String,
    },

    /// A date field does not match the configured format.
    #[error("invalid date '{value}' (expected format {format})")]
    InvalidDate {
        /// The raw text.
        value: String,
        /// The strftime-style format that was tried.
        format: String,
    },

    /// A quantity, cost or price is below zero.
    #[error("{field} must not be negative, got '{value}'")]
    NegativeValue {
        /// The offending field.
        field: Field,
        /// The raw text.
        value: String,
    },

    /// A purchase or sale moves no units.
    #[error("quantity must be greater than zero")]
    ZeroQuantity,

    /// A quantity has a fractional part.
    #[error("quantity must be a whole number, got '{value}'")]
    FractionalQuantity {
        /// The raw text.
        value: String,
    },
}

/// Which character separates the integer and fractional part of money.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DecimalSeparator {
    /// `1,234.56`
    #[default]
    Dot,
    /// `1.234,56`
    Comma,
}

impl DecimalSeparator {
    const fn as_char(self) -> char {
        match self {
            Self::Dot => '.',
            Self::Comma => ',',
        }
    }

    const fn grouping_char(self) -> char {
        match self {
            Self::Dot => ',',
            Self::Comma => '.',
        }
    }
}

/// How dates and numbers are written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFormat {
    /// strftime-style date format.
    pub date_format: String,
    /// Decimal separator for money and quantities.
    pub decimal_separator: DecimalSeparator,
}

impl Default for FieldFormat {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            decimal_separator: DecimalSeparator::Dot,
        }
    }
}

impl FieldFormat {
    /// Set the date format.
    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Set the decimal separator.
    #[must_use]
    pub const fn with_decimal_separator(mut self, separator: DecimalSeparator) -> Self {
        self.decimal_separator = separator;
        self
    }
}

/// Build a purchase from its raw fields.
pub fn purchase_from_fields(
    date: Option<&str>,
    quantity: Option<&str>,
    unit_cost: Option<&str>,
    format: &FieldFormat,
) -> Result<PurchaseEvent, FieldError> {
    let date = parse_date(required(date, Field::Date)?, &format.date_format)?;
    let quantity = parse_moved_quantity(required(quantity, Field::Quantity)?, format)?;
    let unit_cost = parse_amount(required(unit_cost, Field::UnitCost)?, Field::UnitCost, format)?;
    Ok(PurchaseEvent::new(date, quantity, unit_cost))
}

/// Build a sale from its raw fields. The unit price is optional.
pub fn sale_from_fields(
    date: Option<&str>,
    quantity: Option<&str>,
    unit_price: Option<&str>,
    format: &FieldFormat,
) -> Result<SaleEvent, FieldError> {
    let date = parse_date(required(date, Field::Date)?, &format.date_format)?;
    let quantity = parse_moved_quantity(required(quantity, Field::Quantity)?, format)?;
    let sale = SaleEvent::new(date, quantity);

    match unit_price.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(sale.with_unit_price(parse_amount(raw, Field::UnitPrice, format)?)),
        None => Ok(sale),
    }
}

/// Build an opening-stock snapshot from its raw fields. A zero quantity is
/// allowed.
pub fn opening_from_fields(
    quantity: Option<&str>,
    unit_cost: Option<&str>,
    format: &FieldFormat,
) -> Result<OpeningStock, FieldError> {
    let quantity = parse_quantity(required(quantity, Field::Quantity)?, format)?;
    let unit_cost = parse_amount(required(unit_cost, Field::UnitCost)?, Field::UnitCost, format)?;
    Ok(OpeningStock::new(quantity, unit_cost))
}

/// Parse a money string, handling currency symbols, grouping separators and
/// parentheses for negatives.
///
/// A currency marker may lead the amount (`$`, `Rp`, `USD`, `Rp.`) or trail
/// it (`€`, `EUR`), but not both. Grouping separators must split the integer
/// part into groups of three. Anything else makes the string invalid.
///
/// With [`DecimalSeparator::Comma`] the dot is taken as a grouping separator,
/// so `Rp 1.500,25` is `1500.25`.
#[must_use]
pub fn parse_money(s: &str, separator: DecimalSeparator) -> Option<Decimal> {
    let s = s.trim();
    let (parenthesized, s) = match s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    };

    let (outer_sign, s) = split_sign(s);
    let (prefixed, s) = match strip_currency_prefix(s) {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (inner_sign, s) = split_sign(s);
    let sign = match (outer_sign, inner_sign) {
        (Some(_), Some(_)) => return None,
        (sign, None) | (None, sign) => sign,
    };
    if parenthesized && sign.is_some() {
        return None;
    }
    let s = if prefixed {
        s
    } else {
        strip_currency_suffix(s).unwrap_or(s)
    };

    let value = parse_grouped(s, separator)?;
    let negative = parenthesized || sign == Some('-');
    Some(if negative { -value } else { value })
}

fn split_sign(s: &str) -> (Option<char>, &str) {
    match s.chars().next() {
        Some(sign @ ('-' | '+')) => (Some(sign), s[1..].trim_start()),
        _ => (None, s),
    }
}

const fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥' | '₹' | '₩' | '₱' | '฿' | '₫')
}

/// Strip a leading currency marker: up to three letters starting with an
/// uppercase one, then any currency symbols. A dot may close a letter code
/// when whitespace follows (`Rp. 1.500`).
fn strip_currency_prefix(s: &str) -> Option<&str> {
    let letters = s.bytes().take_while(u8::is_ascii_alphabetic).count();
    if letters > 3 || (letters > 0 && !s.starts_with(|c: char| c.is_ascii_uppercase())) {
        return None;
    }
    let rest = &s[letters..];
    let symbols: usize = rest
        .chars()
        .take_while(|c| is_currency_symbol(*c))
        .map(char::len_utf8)
        .sum();
    if letters + symbols == 0 {
        return None;
    }

    let mut rest = &rest[symbols..];
    if symbols == 0 {
        if let Some(after_dot) = rest.strip_prefix('.') {
            if after_dot.starts_with(char::is_whitespace) {
                rest = after_dot;
            }
        }
    }
    Some(rest.trim_start())
}

/// Strip a trailing currency symbol or three-letter uppercase code.
fn strip_currency_suffix(s: &str) -> Option<&str> {
    if let Some(rest) = s.strip_suffix(is_currency_symbol) {
        return Some(rest.trim_end());
    }
    let letters = s.bytes().rev().take_while(u8::is_ascii_uppercase).count();
    (letters == 3).then(|| s[..s.len() - 3].trim_end())
}

/// Parse an unsigned number whose integer part may be grouped in thousands.
fn parse_grouped(s: &str, separator: DecimalSeparator) -> Option<Decimal> {
    let (int_part, frac_part) = match s.split_once(separator.as_char()) {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (s, None),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let groups: Vec<&str> = int_part.split(separator.grouping_char()).collect();
    let grouped = groups.len() > 1;
    for (i, group) in groups.iter().copied().enumerate() {
        let width_ok = match (grouped, i) {
            (false, _) => true,
            (true, 0) => (1..=3).contains(&group.len()),
            (true, _) => group.len() == 3,
        };
        if !width_ok || !all_digits(group) {
            return None;
        }
    }

    let mut digits: String = groups.concat();
    if let Some(frac) = frac_part {
        if frac.is_empty() || !all_digits(frac) {
            return None;
        }
        if digits.is_empty() {
            digits.push('0');
        }
        digits.push('.');
        digits.push_str(frac);
    }
    if digits.is_empty() {
        return None;
    }
    Decimal::from_str(&digits).ok()
}

fn required(raw: Option<&str>, field: Field) -> Result<&str, FieldError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(FieldError::MissingField(field))
}

fn parse_date(raw: &str, format: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw, format).map_err(|_| FieldError::InvalidDate {
        value: raw.to_string(),
        format: format.to_string(),
    })
}

fn parse_amount(raw: &str, field: Field, format: &FieldFormat) -> Result<Decimal, FieldError> {
    let value = parse_money(raw, format.decimal_separator).ok_or_else(|| {
        FieldError::InvalidNumber {
            field,
            value: raw.to_string(),
        }
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(FieldError::NegativeValue {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// Parse a unit count: an optional sign, then digits with optional grouping
/// separators and decimal part. The value must be whole.
fn parse_quantity(raw: &str, format: &FieldFormat) -> Result<u64, FieldError> {
    let invalid = || FieldError::InvalidNumber {
        field: Field::Quantity,
        value: raw.to_string(),
    };

    let (sign, digits) = split_sign(raw);
    let value = parse_grouped(digits, format.decimal_separator).ok_or_else(invalid)?;
    if sign == Some('-') && !value.is_zero() {
        return Err(FieldError::NegativeValue {
            field: Field::Quantity,
            value: raw.to_string(),
        });
    }
    if !value.fract().is_zero() {
        return Err(FieldError::FractionalQuantity {
            value: raw.to_string(),
        });
    }
    value.to_u64().ok_or_else(invalid)
}

/// Parse the unit count of a purchase or sale, which must move stock.
fn parse_moved_quantity(raw: &str, format: &FieldFormat) -> Result<u64, FieldError> {
    match parse_quantity(raw, format)? {
        0 => Err(FieldError::ZeroQuantity),
        quantity => Ok(quantity),
    }
}
