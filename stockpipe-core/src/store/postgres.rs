//! PostgreSQL `BarStore` backed by sqlx.
//!
//! The store is blocking from the caller's point of view: it owns a
//! current-thread tokio runtime and drives each sqlx call to completion.
//! Every `upsert_bars` call opens one connection, runs one transaction, and
//! closes the connection before returning, whatever the outcome.

use super::{check_batch_symbol, BarStore, StorageError};
use crate::config::DatabaseConfig;
use crate::domain::PriceBar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, warn};

/// DDL for the target table.
pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stock_data (
    symbol VARCHAR(10) NOT NULL,
    trade_date DATE NOT NULL,
    open_price NUMERIC,
    high_price NUMERIC,
    low_price NUMERIC,
    close_price NUMERIC,
    volume BIGINT,
    PRIMARY KEY (symbol, trade_date)
)
"#;

const UPSERT_SQL: &str = r#"
INSERT INTO stock_data (symbol, trade_date, open_price, high_price, low_price, close_price, volume)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (symbol, trade_date) DO UPDATE SET
    open_price = EXCLUDED.open_price,
    high_price = EXCLUDED.high_price,
    low_price = EXCLUDED.low_price,
    close_price = EXCLUDED.close_price,
    volume = EXCLUDED.volume
"#;

const SELECT_SQL: &str = r#"
SELECT symbol, trade_date, open_price, high_price, low_price, close_price, volume
FROM stock_data
WHERE symbol = $1
ORDER BY trade_date
"#;

type StockRow = (String, NaiveDate, Decimal, Decimal, Decimal, Decimal, i64);

pub struct PostgresStore {
    options: PgConnectOptions,
    runtime: tokio::runtime::Runtime,
}

impl PostgresStore {
    pub fn new(config: &DatabaseConfig) -> Result<Self, StorageError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(config.password());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StorageError::Runtime(e.to_string()))?;

        Ok(Self { options, runtime })
    }

    /// Create `stock_data` if it does not exist yet.
    pub fn ensure_table(&self) -> Result<(), StorageError> {
        self.runtime.block_on(self.ensure_table_async())
    }

    async fn ensure_table_async(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::Query(e.to_string()));
        close(conn).await;
        result
    }

    async fn upsert_async(&self, symbol: &str, bars: &[PriceBar]) -> Result<usize, StorageError> {
        let mut conn = self.connect().await?;
        let result = write_batch(&mut conn, symbol, bars).await;
        close(conn).await;
        result
    }

    async fn load_async(&self, symbol: &str) -> Result<Vec<PriceBar>, StorageError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_as::<_, StockRow>(SELECT_SQL)
            .bind(symbol)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| StorageError::Query(e.to_string()));
        close(conn).await;

        Ok(result?
            .into_iter()
            .map(|(symbol, trade_date, open, high, low, close_price, volume)| PriceBar {
                symbol,
                trade_date,
                open,
                high,
                low,
                close: close_price,
                volume,
            })
            .collect())
    }

    async fn connect(&self) -> Result<PgConnection, StorageError> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| StorageError::Connect(e.to_string()))?;
        debug!("database connection opened");
        Ok(conn)
    }
}

impl BarStore for PostgresStore {
    fn name(&self) -> &str {
        "postgres"
    }

    fn upsert_bars(&self, symbol: &str, bars: &[PriceBar]) -> Result<usize, StorageError> {
        check_batch_symbol(symbol, bars)?;
        self.runtime.block_on(self.upsert_async(symbol, bars))
    }

    fn load_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StorageError> {
        self.runtime.block_on(self.load_async(symbol))
    }
}

/// One transaction: every row upserted, then a single commit. On any row
/// failure the transaction is rolled back and nothing is visible.
async fn write_batch(
    conn: &mut PgConnection,
    symbol: &str,
    bars: &[PriceBar],
) -> Result<usize, StorageError> {
    let mut tx = conn
        .begin()
        .await
        .map_err(|e| StorageError::Query(format!("begin transaction: {e}")))?;

    for bar in bars {
        let written = sqlx::query(UPSERT_SQL)
            .bind(symbol)
            .bind(bar.trade_date)
            .bind(bar.open)
            .bind(bar.high)
            .bind(bar.low)
            .bind(bar.close)
            .bind(bar.volume)
            .execute(&mut *tx)
            .await;

        if let Err(e) = written {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback failed");
            }
            return Err(StorageError::Write {
                trade_date: bar.trade_date,
                reason: e.to_string(),
            });
        }
    }

    tx.commit()
        .await
        .map_err(|e| StorageError::Commit(e.to_string()))?;
    Ok(bars.len())
}

async fn close(conn: PgConnection) {
    match conn.close().await {
        Ok(()) => debug!("database connection closed"),
        Err(e) => warn!(error = %e, "database connection did not close cleanly"),
    }
}
