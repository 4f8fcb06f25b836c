// In crates/core-types/src/types.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifier of a tradable instrument (e.g., "PETR4.SA").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(pub String);

impl Ticker {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(value: &str) -> Self {
        Ticker(value.to_string())
    }
}

impl From<String> for Ticker {
    fn from(value: String) -> Self {
        Ticker(value)
    }
}

/// A single OHLCV sample. Only `close` is guaranteed; the other fields depend
/// on the granularity the source provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceSample {
    /// Builds a sample carrying only a close price.
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Derived indicator values for one sample.
///
/// `None` means the window has not seen enough history yet. It is never
/// replaced by zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Simple moving average of the close.
    pub sma: Option<f64>,
    /// Relative strength index of the close.
    pub rsi: Option<f64>,
    /// Rolling standard deviation of close-to-close returns, in percent.
    pub volatility_pct: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
}

/// A price sample together with the indicators computed up to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSample {
    pub sample: PriceSample,
    pub indicators: IndicatorSnapshot,
}

/// The closed output alphabet of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSymbol {
    Buy,
    Hold,
    Sell,
    NotBuy,
}

impl DecisionSymbol {
    /// Every valid symbol, in prompt order.
    pub const ALL: [DecisionSymbol; 4] = [
        DecisionSymbol::Buy,
        DecisionSymbol::Hold,
        DecisionSymbol::Sell,
        DecisionSymbol::NotBuy,
    ];

    /// The conservative fallback used when an answer cannot be understood.
    pub const FALLBACK: DecisionSymbol = DecisionSymbol::NotBuy;

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionSymbol::Buy => "BUY",
            DecisionSymbol::Hold => "HOLD",
            DecisionSymbol::Sell => "SELL",
            DecisionSymbol::NotBuy => "NOT_BUY",
        }
    }
}

impl fmt::Display for DecisionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionSymbol {
    type Err = Error;

    /// Exact, case-sensitive match against the canonical tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecisionSymbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == s)
            .ok_or_else(|| Error::UnknownDecision(s.to_string()))
    }
}

/// The state threaded between runs for a ticker: either nothing has been
/// recorded yet, or the decision of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LastAction {
    #[default]
    None,
    Decided(DecisionSymbol),
}

impl LastAction {
    pub const NONE_TOKEN: &'static str = "NONE";

    pub fn as_str(&self) -> &'static str {
        match self {
            LastAction::None => Self::NONE_TOKEN,
            LastAction::Decided(symbol) => symbol.as_str(),
        }
    }

    pub fn decision(&self) -> Option<DecisionSymbol> {
        match self {
            LastAction::None => None,
            LastAction::Decided(symbol) => Some(*symbol),
        }
    }
}

impl From<DecisionSymbol> for LastAction {
    fn from(symbol: DecisionSymbol) -> Self {
        LastAction::Decided(symbol)
    }
}

impl fmt::Display for LastAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LastAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::NONE_TOKEN {
            return Ok(LastAction::None);
        }
        s.parse::<DecisionSymbol>().map(LastAction::Decided)
    }
}

/// One row of the decision ledger. Everything in it belongs to the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// When the run produced this decision.
    pub timestamp: DateTime<Utc>,
    pub ticker: Ticker,
    /// The decision that was current when the oracle was asked.
    pub last_action: LastAction,
    pub close: f64,
    pub sma: Option<f64>,
    pub rsi: Option<f64>,
    pub decision: DecisionSymbol,
}

impl DecisionRecord {
    /// The seven ledger columns, in storage order.
    pub fn row(&self) -> [String; 7] {
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.ticker.0.clone(),
            self.last_action.to_string(),
            self.close.to_string(),
            display_value(self.sma),
            display_value(self.rsi),
            self.decision.to_string(),
        ]
    }
}

/// Renders an optional indicator value, keeping "undefined" visible.
pub fn display_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => "undefined".to_string(),
    }
}
