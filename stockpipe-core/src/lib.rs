//! stockpipe core — fetch one symbol's daily bars and upsert them.
//!
//! - `config`: explicit, validated run configuration
//! - `data`: Alpha Vantage client and row mapping
//! - `store`: keyed upsert stores (Postgres, in-memory)
//! - `pipeline`: the fetch → map → store sequence

pub mod config;
pub mod data;
pub mod domain;
pub mod logging;
pub mod pipeline;
pub mod store;

pub use config::{ConfigError, FileConfig, PipelineConfig};
pub use domain::PriceBar;
pub use pipeline::{run_from_lookup, run_with_config, Pipeline, PipelineError, RunSummary};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: components shared with the pipeline are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceBar>();
        require_sync::<PriceBar>();
        require_send::<data::AlphaVantageClient>();
        require_sync::<data::AlphaVantageClient>();
        require_send::<store::PostgresStore>();
        require_sync::<store::PostgresStore>();
        require_send::<store::MemoryStore>();
        require_sync::<store::MemoryStore>();
        require_send::<PipelineError>();
        require_sync::<PipelineError>();
    }
}
