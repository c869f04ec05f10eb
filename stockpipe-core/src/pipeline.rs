//! Pipeline orchestrator — fetch, map, and store one symbol.
//!
//! Failures are logged with context and handed back unchanged. There are no
//! retries and no partial-success results: a run either stores every row of
//! the response or stores nothing.

use crate::config::{ConfigError, FileConfig, PipelineConfig};
use crate::data::{map_series, AlphaVantageClient, DailySeriesSource, FetchError, ParseError};
use crate::store::{BarStore, PostgresStore, StorageError};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid symbol: '{0}'")]
    InvalidSymbol(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("row mapping failed: {0}")]
    Parse(#[from] ParseError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub symbol: String,
    /// Entries in the provider response.
    pub fetched: usize,
    /// Rows upserted.
    pub stored: usize,
}

/// One source, one store, one symbol per `run`.
pub struct Pipeline<'a> {
    source: &'a dyn DailySeriesSource,
    store: &'a dyn BarStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn DailySeriesSource, store: &'a dyn BarStore) -> Self {
        Self { source, store }
    }

    pub fn run(&self, symbol: &str) -> Result<RunSummary, PipelineError> {
        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.chars().any(|c| c.is_whitespace() || c.is_control()) {
            error!(symbol, "rejecting symbol");
            return Err(PipelineError::InvalidSymbol(symbol.to_string()));
        }

        info!(
            symbol,
            source = self.source.name(),
            store = self.store.name(),
            "starting stock pipeline"
        );

        let series = self
            .source
            .fetch_daily(symbol)
            .inspect_err(|e| error!(symbol, error = %e, "fetching daily series failed"))?;

        let bars = map_series(symbol, &series)
            .inspect_err(|e| error!(symbol, error = %e, "mapping daily series failed"))?;

        if bars.is_empty() {
            warn!(symbol, "provider returned an empty daily series, nothing to store");
            return Ok(RunSummary {
                symbol: symbol.to_string(),
                fetched: 0,
                stored: 0,
            });
        }

        let stored = self
            .store
            .upsert_bars(symbol, &bars)
            .inspect_err(|e| error!(symbol, rows = bars.len(), error = %e, "storing rows failed"))?;

        info!(symbol, stored, "finished stock pipeline");
        Ok(RunSummary {
            symbol: symbol.to_string(),
            fetched: series.len(),
            stored,
        })
    }
}

/// Run against Alpha Vantage and Postgres with an already validated config.
pub fn run_with_config(config: &PipelineConfig, symbol: &str) -> Result<RunSummary, PipelineError> {
    let client = AlphaVantageClient::new(&config.alpha_vantage)?;
    let store = PostgresStore::new(&config.database)?;
    Pipeline::new(&client, &store).run(symbol)
}

/// Load and validate configuration, then run. Configuration problems surface
/// before any request is made.
pub fn run_from_lookup<F>(
    lookup: F,
    file: Option<&FileConfig>,
    symbol: &str,
) -> Result<RunSummary, PipelineError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = PipelineConfig::from_lookup(lookup, file)
        .inspect_err(|e| error!(error = %e, "configuration rejected"))?;
    run_with_config(&config, symbol)
}
