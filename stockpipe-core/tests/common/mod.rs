#![allow(dead_code)]

use httpmock::MockServer;
use std::collections::HashMap;
use stockpipe_core::config::{AlphaVantageConfig, ApiKey};

pub const TEST_KEY: &str = "test-key-123";

/// Alpha Vantage config pointed at a mock server.
pub fn av_config(server: &MockServer) -> AlphaVantageConfig {
    AlphaVantageConfig {
        api_key: ApiKey::new(TEST_KEY).unwrap(),
        base_url: server.url("/query"),
    }
}

/// `TIME_SERIES_DAILY` body for `(date, open, high, low, close, volume)` rows.
pub fn daily_body(symbol: &str, rows: &[(&str, &str, &str, &str, &str, &str)]) -> String {
    let entries: Vec<String> = rows
        .iter()
        .map(|(date, open, high, low, close, volume)| {
            format!(
                r#""{date}": {{"1. open": "{open}", "2. high": "{high}", "3. low": "{low}", "4. close": "{close}", "5. volume": "{volume}"}}"#
            )
        })
        .collect();

    format!(
        r#"{{
  "Meta Data": {{
    "1. Information": "Daily Prices (open, high, low, close) and Volumes",
    "2. Symbol": "{symbol}",
    "3. Last Refreshed": "2024-01-03",
    "4. Output Size": "Compact",
    "5. Time Zone": "US/Eastern"
  }},
  "Time Series (Daily)": {{
    {}
  }}
}}"#,
        entries.join(",\n    ")
    )
}

/// Environment lookup over a fixed map.
pub fn lookup(vars: HashMap<&'static str, String>) -> impl Fn(&str) -> Option<String> {
    move |key: &str| vars.get(key).cloned()
}
