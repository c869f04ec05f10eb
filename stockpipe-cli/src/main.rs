//! stockpipe CLI — daily price ingestion for one symbol.
//!
//! Commands:
//! - `run <SYMBOL>` — fetch the symbol's daily series and upsert it into `stock_data`
//! - `init-db` — create the `stock_data` table if it does not exist
//!
//! Configuration comes from the environment (a `.env` file is loaded if
//! present), optionally layered over a TOML file given with `--config`.
//! Any failure exits non-zero so the scheduler can mark the run failed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stockpipe_core::config::{AlphaVantageConfig, DatabaseConfig, FileConfig};
use stockpipe_core::data::AlphaVantageClient;
use stockpipe_core::store::{BarStore, MemoryStore, PostgresStore};
use stockpipe_core::{logging, run_from_lookup, Pipeline, RunSummary};

#[derive(Parser)]
#[command(
    name = "stockpipe",
    about = "stockpipe — fetch daily stock prices and upsert them into Postgres"
)]
struct Cli {
    /// Optional TOML file with non-secret settings. Environment wins.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one symbol's daily series and upsert it.
    Run {
        /// Ticker symbol (e.g., AAPL).
        symbol: String,

        /// Fetch and map, but keep rows in memory instead of writing to the database.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Create the stock_data table if it does not exist.
    InitDb,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let file = load_file_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { symbol, dry_run } => {
            let summary = if dry_run {
                run_dry(file.as_ref(), &symbol)?
            } else {
                run_from_lookup(env_lookup, file.as_ref(), &symbol)
                    .with_context(|| format!("stock pipeline failed for {symbol}"))?
            };
            print_summary(&summary, dry_run);
            Ok(())
        }
        Commands::InitDb => run_init_db(file.as_ref()),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn load_file_config(path: Option<&Path>) -> Result<Option<FileConfig>> {
    path.map(|p| FileConfig::from_file(p).context("loading --config"))
        .transpose()
}

fn run_dry(file: Option<&FileConfig>, symbol: &str) -> Result<RunSummary> {
    let config = AlphaVantageConfig::from_lookup(&env_lookup, file)?;
    let client = AlphaVantageClient::new(&config)?;
    let store = MemoryStore::new();

    let summary = Pipeline::new(&client, &store)
        .run(symbol)
        .with_context(|| format!("dry run failed for {symbol}"))?;

    for bar in store.load_bars(&summary.symbol)? {
        println!(
            "{} {} open={} high={} low={} close={} volume={}",
            bar.symbol, bar.trade_date, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }
    Ok(summary)
}

fn run_init_db(file: Option<&FileConfig>) -> Result<()> {
    let config = DatabaseConfig::from_lookup(&env_lookup, file)?;
    let store = PostgresStore::new(&config)?;
    store
        .ensure_table()
        .with_context(|| format!("creating stock_data on {}:{}", config.host, config.port))?;
    tracing::info!(host = %config.host, database = %config.name, "stock_data table ready");
    Ok(())
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    let verb = if dry_run { "mapped" } else { "stored/updated" };
    println!(
        "{}: {verb} {} of {} records",
        summary.symbol, summary.stored, summary.fetched
    );
}
