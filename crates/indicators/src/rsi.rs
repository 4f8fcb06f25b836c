// In crates/indicators/src/rsi.rs

use ta::Next;

use crate::error::{Error, Result};

/// Relative strength index with Wilder smoothing.
///
/// Gains and losses are averaged with `alpha = 1 / period` and the running
/// averages start from the first sample, which contributes no change. The
/// first value is produced at the `period`-th sample. A window without any
/// loss reads 100.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    alpha: f64,
    avg_gain: f64,
    avg_loss: f64,
    previous: Option<f64>,
    count: usize,
}

impl WilderRsi {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(Error::InvalidParameter("rsi_window must be at least 1".into()));
        }
        Ok(Self {
            period,
            alpha: 1.0 / period as f64,
            avg_gain: 0.0,
            avg_loss: 0.0,
            previous: None,
            count: 0,
        })
    }
}

impl Next<f64> for WilderRsi {
    type Output = Option<f64>;

    fn next(&mut self, close: f64) -> Self::Output {
        let change = self.previous.map_or(0.0, |prev| close - prev);
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if self.count == 0 {
            self.avg_gain = gain;
            self.avg_loss = loss;
        } else {
            self.avg_gain += self.alpha * (gain - self.avg_gain);
            self.avg_loss += self.alpha * (loss - self.avg_loss);
        }
        self.previous = Some(close);
        self.count += 1;

        if self.count < self.period {
            return None;
        }
        if self.avg_loss == 0.0 {
            return Some(100.0);
        }
        Some(100.0 - 100.0 / (1.0 + self.avg_gain / self.avg_loss))
    }
}
