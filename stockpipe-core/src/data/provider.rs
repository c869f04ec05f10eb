//! Daily series source trait and structured fetch errors.
//!
//! `DailySeriesSource` abstracts over where the raw per-date dictionary comes
//! from, so the pipeline can run against Alpha Vantage in production and a
//! canned source in tests.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name → raw JSON value for one trading day.
pub type DailyFields = BTreeMap<String, Value>;

/// Raw provider payload: date string → field name → value.
///
/// Shape is checked (the data key exists), contents are not. Values are kept
/// as JSON so a non-string field surfaces as a mapping error, not a fetch error.
pub type DailySeries = BTreeMap<String, DailyFields>;

/// Alpha Vantage `outputsize` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSize {
    /// Latest 100 trading days.
    #[default]
    Compact,
    /// Full history.
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

/// The provider answered, but not with a usable daily series.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Explicit `"Error Message"` in the body: bad key, unknown symbol.
    #[error("provider rejected the request: {message}")]
    Rejected { message: String },

    /// No daily series in the body. Over-quota and premium notices land here.
    #[error("unexpected response format: no daily series{}", note_suffix(.note))]
    MissingSeries { note: Option<String> },

    /// Body was not the expected JSON document.
    #[error("malformed response body: {0}")]
    Malformed(String),
}

fn note_suffix(note: &Option<String>) -> String {
    note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Trait for daily series providers.
pub trait DailySeriesSource: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the daily series for one symbol. Exactly one request, no retries.
    fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, FetchError>;
}
