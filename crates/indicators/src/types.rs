// In crates/indicators/src/types.rs

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Window lengths used by the [`crate::IndicatorEngine`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IndicatorSettings {
    #[serde(default = "default_sma_window")]
    pub sma_window: usize,
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,
    /// Number of close-to-close returns in the volatility window.
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,
    /// Band width in standard deviations.
    #[serde(default = "default_bollinger_std_dev")]
    pub bollinger_std_dev: f64,
}

impl IndicatorSettings {
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("sma_window", self.sma_window),
            ("rsi_window", self.rsi_window),
            ("volatility_window", self.volatility_window),
            ("bollinger_window", self.bollinger_window),
        ];
        for (name, window) in windows {
            if window == 0 {
                return Err(Error::InvalidParameter(format!("{} must be at least 1", name)));
            }
        }
        if self.volatility_window < 2 {
            return Err(Error::InvalidParameter("volatility_window must be at least 2".into()));
        }
        if !(self.bollinger_std_dev.is_finite() && self.bollinger_std_dev > 0.0) {
            return Err(Error::InvalidParameter("bollinger_std_dev must be positive".into()));
        }
        Ok(())
    }
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            sma_window: default_sma_window(),
            rsi_window: default_rsi_window(),
            volatility_window: default_volatility_window(),
            bollinger_window: default_bollinger_window(),
            bollinger_std_dev: default_bollinger_std_dev(),
        }
    }
}

fn default_sma_window() -> usize { 10 }
fn default_rsi_window() -> usize { 14 }
fn default_volatility_window() -> usize { 10 }
fn default_bollinger_window() -> usize { 20 }
fn default_bollinger_std_dev() -> f64 { 2.0 }
