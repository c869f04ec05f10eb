//! Data acquisition: provider trait, Alpha Vantage client, row mapping

pub mod alpha_vantage;
pub mod mapper;
pub mod provider;

pub use alpha_vantage::AlphaVantageClient;
pub use mapper::{map_entry, map_series, ParseError};
pub use provider::{ApiError, DailyFields, DailySeries, DailySeriesSource, FetchError, OutputSize};
