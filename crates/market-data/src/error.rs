// In crates/market-data/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No data found for {ticker}")]
    NoData { ticker: String },
    #[error("Invalid chart URL: {0}")]
    InvalidUrl(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    #[error("API error: code {code}, msg: {msg}")]
    ApiError { code: String, msg: String },
}

impl Error {
    /// True when the source answered but had nothing for the ticker.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::NoData { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
