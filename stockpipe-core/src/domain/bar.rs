//! PriceBar — one symbol's daily open/high/low/close/volume.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single symbol, keyed by `(symbol, trade_date)`.
///
/// Prices are kept as `Decimal` so that the values written to the `NUMERIC`
/// columns are exactly the text the provider sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl PriceBar {
    /// Primary key of the persisted row.
    pub fn key(&self) -> (&str, NaiveDate) {
        (&self.symbol, self.trade_date)
    }
}
