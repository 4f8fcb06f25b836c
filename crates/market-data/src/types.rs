// In crates/market-data/src/types.rs

use reqwest::Client;
use serde::Deserialize;

/// Client for the Yahoo Finance chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooClient {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// Scheme and host of the chart API.
    pub base_url: String,
    /// Lookback range sent with every request (e.g., "1d").
    pub range: String,
    /// Sampling interval sent with every request (e.g., "5m").
    pub interval: String,
}

/// Top-level envelope of `GET /v8/finance/chart/{ticker}`.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    /// Sample open times, in Unix seconds.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Column-oriented OHLCV arrays. Yahoo leaves `null` holes for intervals
/// without trades.
#[derive(Debug, Deserialize, Default)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}
