//! Row mapping: raw provider field values to typed `PriceBar`s.
//!
//! Pure functions, no I/O. A batch is all-or-nothing: the first malformed
//! record fails the whole symbol and nothing is returned.

use super::provider::{DailyFields, DailySeries};
use crate::domain::PriceBar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::borrow::Cow;
use std::str::FromStr;
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const OPEN_FIELD: &str = "1. open";
pub const HIGH_FIELD: &str = "2. high";
pub const LOW_FIELD: &str = "3. low";
pub const CLOSE_FIELD: &str = "4. close";
pub const VOLUME_FIELD: &str = "5. volume";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid trade date '{date}' (expected YYYY-MM-DD)")]
    InvalidDate { date: String },

    #[error("{date}: missing field '{field}'")]
    MissingField { date: String, field: &'static str },

    #[error("{date}: field '{field}' is not a decimal: '{value}'")]
    InvalidDecimal {
        date: String,
        field: &'static str,
        value: String,
    },

    #[error("{date}: volume is not an integer: '{value}'")]
    InvalidVolume { date: String, value: String },
}

/// Map every entry of a daily series to a `PriceBar`, ascending by date.
pub fn map_series(symbol: &str, series: &DailySeries) -> Result<Vec<PriceBar>, ParseError> {
    let mut bars = series
        .iter()
        .map(|(date, fields)| map_entry(symbol, date, fields))
        .collect::<Result<Vec<_>, _>>()?;

    // Order by parsed date, not key text.
    bars.sort_by_key(|b| b.trade_date);
    Ok(bars)
}

/// Map one `date → fields` entry.
pub fn map_entry(symbol: &str, date: &str, fields: &DailyFields) -> Result<PriceBar, ParseError> {
    let trade_date =
        NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| ParseError::InvalidDate {
            date: date.to_string(),
        })?;

    Ok(PriceBar {
        symbol: symbol.to_string(),
        trade_date,
        open: decimal_field(date, fields, OPEN_FIELD)?,
        high: decimal_field(date, fields, HIGH_FIELD)?,
        low: decimal_field(date, fields, LOW_FIELD)?,
        close: decimal_field(date, fields, CLOSE_FIELD)?,
        volume: volume_field(date, fields)?,
    })
}

fn field<'a>(
    date: &str,
    fields: &'a DailyFields,
    name: &'static str,
) -> Result<&'a Value, ParseError> {
    fields.get(name).ok_or_else(|| ParseError::MissingField {
        date: date.to_string(),
        field: name,
    })
}

/// Text of a field. JSON numbers are read through their rendering; `null`,
/// booleans and containers have none.
fn field_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.trim())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

fn shown(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn decimal_field(
    date: &str,
    fields: &DailyFields,
    name: &'static str,
) -> Result<Decimal, ParseError> {
    let value = field(date, fields, name)?;
    field_text(value)
        .and_then(|text| Decimal::from_str(&text).ok())
        .ok_or_else(|| ParseError::InvalidDecimal {
            date: date.to_string(),
            field: name,
            value: shown(value),
        })
}

fn volume_field(date: &str, fields: &DailyFields) -> Result<i64, ParseError> {
    let value = field(date, fields, VOLUME_FIELD)?;
    field_text(value)
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(|| ParseError::InvalidVolume {
            date: date.to_string(),
            value: shown(value),
        })
}
