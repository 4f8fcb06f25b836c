// In crates/indicators/src/volatility.rs

use std::collections::VecDeque;

use ta::Next;

use crate::error::{Error, Result};

/// Rolling sample standard deviation (`n - 1` denominator).
///
/// Yields `None` until `period` values have been seen.
#[derive(Debug, Clone)]
pub struct SampleStdDev {
    period: usize,
    window: VecDeque<f64>,
}

impl SampleStdDev {
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(Error::InvalidParameter("volatility_window must be at least 2".into()));
        }
        Ok(Self {
            period,
            window: VecDeque::with_capacity(period + 1),
        })
    }
}

impl Next<f64> for SampleStdDev {
    type Output = Option<f64>;

    fn next(&mut self, value: f64) -> Self::Output {
        self.window.push_back(value);
        if self.window.len() > self.period {
            self.window.pop_front();
        }
        if self.window.len() < self.period {
            return None;
        }

        let n = self.period as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let squares: f64 = self.window.iter().map(|v| (v - mean).powi(2)).sum();
        Some((squares / (n - 1.0)).sqrt())
    }
}
