//! In-process `BarStore`.
//!
//! Same contract as the Postgres store: keyed upsert, one batch per commit.
//! Writes go to a staged copy that replaces the live map only when every row
//! succeeded. Used for dry runs and tests.

use super::{check_batch_symbol, BarStore, StorageError};
use crate::domain::PriceBar;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<(String, NaiveDate), PriceBar>>,
    fail_at_row: Option<usize>,
    upsert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes fail on the row at `index` (0-based) of every batch.
    #[cfg(test)]
    pub(crate) fn failing_at_row(index: usize) -> Self {
        Self {
            fail_at_row: Some(index),
            ..Self::default()
        }
    }

    /// Number of `upsert_bars` calls received, successful or not.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Total rows across all symbols.
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BarStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn upsert_bars(&self, symbol: &str, bars: &[PriceBar]) -> Result<usize, StorageError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        check_batch_symbol(symbol, bars)?;

        let mut rows = self
            .rows
            .lock()
            .map_err(|e| StorageError::Runtime(format!("store lock poisoned: {e}")))?;

        let mut staged = rows.clone();
        for (i, bar) in bars.iter().enumerate() {
            if self.fail_at_row == Some(i) {
                return Err(StorageError::Write {
                    trade_date: bar.trade_date,
                    reason: "injected write failure".into(),
                });
            }
            let (sym, trade_date) = bar.key();
            staged.insert((sym.to_string(), trade_date), bar.clone());
        }

        *rows = staged;
        Ok(bars.len())
    }

    fn load_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StorageError> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| StorageError::Runtime(format!("store lock poisoned: {e}")))?;

        Ok(rows
            .iter()
            .filter(|((sym, _), _)| sym == symbol)
            .map(|(_, bar)| bar.clone())
            .collect())
    }
}
