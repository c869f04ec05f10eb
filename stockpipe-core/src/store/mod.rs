//! Persistence of price bars.
//!
//! `BarStore` is the upsert contract the pipeline writes through. A call
//! writes the whole batch or nothing.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::PriceBar;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection failed: {0}")]
    Connect(String),

    #[error("write failed for trade date {trade_date}: {reason}")]
    Write { trade_date: NaiveDate, reason: String },

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("storage runtime error: {0}")]
    Runtime(String),

    #[error("row for '{found}' passed in a batch for '{expected}'")]
    SymbolMismatch { expected: String, found: String },
}

/// Keyed upsert store for `PriceBar` rows.
pub trait BarStore: Send + Sync {
    /// Human-readable name of this store.
    fn name(&self) -> &str;

    /// Insert or overwrite every row of `bars` for `symbol`, keyed on
    /// `(symbol, trade_date)`. All rows are committed together or not at all.
    /// Returns the number of rows written.
    fn upsert_bars(&self, symbol: &str, bars: &[PriceBar]) -> Result<usize, StorageError>;

    /// Read back every stored row for `symbol`, ascending by trade date.
    fn load_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StorageError>;
}

/// Every row in a batch must belong to the batch's symbol.
pub(crate) fn check_batch_symbol(symbol: &str, bars: &[PriceBar]) -> Result<(), StorageError> {
    match bars.iter().find(|b| b.symbol != symbol) {
        Some(stray) => Err(StorageError::SymbolMismatch {
            expected: symbol.to_string(),
            found: stray.symbol.clone(),
        }),
        None => Ok(()),
    }
}
