//! Alpha Vantage daily time series client.
//!
//! Issues one blocking `TIME_SERIES_DAILY` request per call and checks the
//! shape of the answer. An explicit `"Error Message"` is reported as a
//! rejection; a body without the daily series key is reported as a format
//! problem, carrying any `"Note"`/`"Information"` text the provider added
//! (that is where quota notices appear).

use super::provider::{ApiError, DailySeries, DailySeriesSource, FetchError, OutputSize};
use crate::config::AlphaVantageConfig;
use serde::Deserialize;
use tracing::{debug, trace};

const DAILY_FUNCTION: &str = "TIME_SERIES_DAILY";

/// Subset of the response document we care about. Unknown keys (such as
/// `"Meta Data"`) are ignored.
#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Time Series (Daily)")]
    series: Option<DailySeries>,
}

/// Alpha Vantage data provider.
pub struct AlphaVantageClient {
    client: reqwest::blocking::Client,
    config: AlphaVantageConfig,
    output_size: OutputSize,
}

impl AlphaVantageClient {
    pub fn new(config: &AlphaVantageConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("stockpipe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
            output_size: OutputSize::default(),
        })
    }

    pub fn with_output_size(mut self, output_size: OutputSize) -> Self {
        self.output_size = output_size;
        self
    }

    /// Check a decoded body and pull out the daily series.
    fn parse_body(body: &str) -> Result<DailySeries, ApiError> {
        let resp: DailyResponse =
            serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;

        if let Some(message) = resp.error_message {
            return Err(ApiError::Rejected { message });
        }

        resp.series.ok_or(ApiError::MissingSeries {
            note: resp.note.or(resp.information),
        })
    }
}

impl DailySeriesSource for AlphaVantageClient {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch_daily(&self, symbol: &str) -> Result<DailySeries, FetchError> {
        debug!(
            symbol,
            endpoint = %self.config.base_url,
            outputsize = self.output_size.as_str(),
            "requesting daily series"
        );

        let resp = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("function", DAILY_FUNCTION),
                ("symbol", symbol),
                ("apikey", self.config.api_key.expose()),
                ("outputsize", self.output_size.as_str()),
            ])
            .send()
            // The URL carries the API key; keep it out of error text.
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "HTTP {status} from {} for {symbol}",
                self.name()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;
        trace!(symbol, body = %body, "raw response");

        let series = Self::parse_body(&body)?;
        debug!(symbol, entries = series.len(), "daily series received");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_series_and_ignores_meta_data() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "AAPL"},
            "Time Series (Daily)": {
                "2024-01-02": {
                    "1. open": "185.0",
                    "2. high": "186.0",
                    "3. low": "184.0",
                    "4. close": "185.5",
                    "5. volume": "1000000"
                }
            }
        }"#;

        let series = AlphaVantageClient::parse_body(body).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series["2024-01-02"]["4. close"], "185.5");
    }

    #[test]
    fn error_message_wins_over_series() {
        let body = r#"{
            "Error Message": "Invalid API call.",
            "Time Series (Daily)": {}
        }"#;

        match AlphaVantageClient::parse_body(body) {
            Err(ApiError::Rejected { message }) => assert_eq!(message, "Invalid API call."),
            other => panic!("expected Rejected, got: {other:?}"),
        }
    }

    #[test]
    fn missing_series_carries_note() {
        let body = r#"{"Note": "API call frequency exceeded."}"#;
        match AlphaVantageClient::parse_body(body) {
            Err(ApiError::MissingSeries { note }) => {
                assert_eq!(note.as_deref(), Some("API call frequency exceeded."));
            }
            other => panic!("expected MissingSeries, got: {other:?}"),
        }
    }

    #[test]
    fn missing_series_falls_back_to_information() {
        let body = r#"{"Information": "premium endpoint"}"#;
        match AlphaVantageClient::parse_body(body) {
            Err(ApiError::MissingSeries { note }) => {
                assert_eq!(note.as_deref(), Some("premium endpoint"));
            }
            other => panic!("expected MissingSeries, got: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            AlphaVantageClient::parse_body("<html>down for maintenance</html>"),
            Err(ApiError::Malformed(_))
        ));
        assert!(matches!(
            AlphaVantageClient::parse_body("[1, 2, 3]"),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn field_values_are_not_checked_here() {
        let body = r#"{"Time Series (Daily)": {
            "2024-01-02": {"4. close": null, "5. volume": 1000000}
        }}"#;

        let series = AlphaVantageClient::parse_body(body).unwrap();
        assert!(series["2024-01-02"]["4. close"].is_null());
        assert_eq!(series["2024-01-02"]["5. volume"], 1_000_000);
    }

    #[test]
    fn empty_series_is_not_an_error() {
        let series = AlphaVantageClient::parse_body(r#"{"Time Series (Daily)": {}}"#).unwrap();
        assert!(series.is_empty());
    }
}
