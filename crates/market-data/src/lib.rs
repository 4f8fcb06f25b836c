// In crates/market-data/src/lib.rs

use std::time::Duration;

use app_config::MarketDataSettings;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use core_types::{PriceSample, Ticker};
use reqwest::Url;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// A source of recent price samples for a ticker.
///
/// Implementations return samples oldest first, and report an empty result
/// as `Error::NoData` rather than an empty vector.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// The name of the data source (e.g., "YahooFinance").
    fn name(&self) -> &'static str;

    /// Fetches the configured lookback window for `ticker`.
    async fn fetch_prices(&self, ticker: &Ticker) -> Result<Vec<PriceSample>>;
}

impl YahooClient {
    /// Constructs a new client from `MarketDataSettings`.
    pub fn new(settings: &MarketDataSettings) -> Result<Self> {
        // Yahoo rejects requests without a browser-like user agent.
        let http_client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(YahooClient {
            http_client,
            base_url: settings.base_url.clone(),
            range: settings.range.clone(),
            interval: settings.interval.clone(),
        })
    }

    /// Builds `{base_url}/v8/finance/chart/{ticker}?range=..&interval=..`.
    pub fn chart_url(&self, ticker: &Ticker) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker.as_str()]);
        url.query_pairs_mut()
            .append_pair("range", &self.range)
            .append_pair("interval", &self.interval);
        Ok(url)
    }
}

#[async_trait]
impl MarketData for YahooClient {
    fn name(&self) -> &'static str {
        "YahooFinance"
    }

    async fn fetch_prices(&self, ticker: &Ticker) -> Result<Vec<PriceSample>> {
        let url = self.chart_url(ticker)?;
        tracing::debug!(%ticker, %url, "Requesting chart data.");

        // Error payloads come back with 4xx statuses, so the body is parsed
        // regardless of the status code.
        let response_body = self
            .http_client
            .get(url.as_str())
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let samples = parse_chart(ticker, &response_body)?;
        tracing::info!(%ticker, count = samples.len(), "Fetched price samples.");
        Ok(samples)
    }
}

/// Converts a raw chart payload into price samples.
///
/// Rows whose close is missing are dropped; the other columns may be absent.
pub fn parse_chart(ticker: &Ticker, body: &str) -> Result<Vec<PriceSample>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        if err.code == "Not Found" {
            return Err(Error::NoData { ticker: ticker.0.clone() });
        }
        return Err(Error::ApiError {
            code: err.code,
            msg: err.description,
        });
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(Error::NoData { ticker: ticker.0.clone() });
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut samples: Vec<PriceSample> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = column(&quote.close, i)?;
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            Some(PriceSample {
                timestamp,
                open: column(&quote.open, i),
                high: column(&quote.high, i),
                low: column(&quote.low, i),
                close,
                volume: column(&quote.volume, i),
            })
        })
        .collect();

    if samples.is_empty() {
        return Err(Error::NoData { ticker: ticker.0.clone() });
    }

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

fn column(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker() -> Ticker {
        Ticker::from("PETR4.SA")
    }

    #[test]
    fn chart_payload_becomes_ordered_samples() {
        let body = r#"{"chart":{"result":[{
            "meta":{"symbol":"PETR4.SA"},
            "timestamp":[1714654800,1714655100,1714655400],
            "indicators":{"quote":[{
                "open":[38.1,38.2,null],
                "high":[38.3,38.4,null],
                "low":[38.0,38.1,null],
                "close":[38.2,38.35,null],
                "volume":[120400,98000,null]
            }]}
        }],"error":null}}"#;

        let samples = parse_chart(&ticker(), body).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp.timestamp(), 1714654800);
        assert_eq!(samples[1].close, 38.35);
        assert_eq!(samples[1].open, Some(38.2));
        assert_eq!(samples[0].volume, Some(120400.0));
    }

    #[test]
    fn not_found_error_means_no_data() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

        let err = parse_chart(&Ticker::from("FAKE"), body).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn other_api_errors_are_reported() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input - interval=7m is not supported"}}}"#;

        let err = parse_chart(&ticker(), body).unwrap_err();
        assert!(matches!(err, Error::ApiError { ref code, .. } if code == "Bad Request"));
    }

    #[test]
    fn rows_without_close_do_not_count_as_data() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1714654800],
            "indicators":{"quote":[{"close":[null]}]}
        }],"error":null}}"#;

        assert!(parse_chart(&ticker(), body).unwrap_err().is_no_data());
    }

    #[test]
    fn garbage_is_a_deserialization_failure() {
        let err = parse_chart(&ticker(), "<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, Error::DeserializationFailed(_)));
    }

    #[test]
    fn chart_url_carries_range_and_interval() {
        let client = YahooClient::new(&MarketDataSettings::default()).unwrap();
        let url = client.chart_url(&ticker()).unwrap();

        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/PETR4.SA?range=1d&interval=5m"
        );
    }
}
