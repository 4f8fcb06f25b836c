// In crates/indicators/src/lib.rs

use core_types::{AnnotatedSample, IndicatorSnapshot, PriceSample};
use ta::indicators::{BollingerBands, SimpleMovingAverage as Sma};
use ta::Next;

pub mod error;
pub mod rsi;
pub mod types;
pub mod volatility;

// Re-export public types
pub use error::{Error, Result};
pub use rsi::WilderRsi;
pub use types::IndicatorSettings;
pub use volatility::SampleStdDev;

/// Augments a price table with moving average, RSI, volatility and
/// Bollinger bands.
///
/// The engine is stateless between calls: every `compute` starts its
/// indicators from scratch, so the same table always yields the same output.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    settings: IndicatorSettings,
}

impl IndicatorEngine {
    /// Creates an engine after checking that every window is usable.
    pub fn new(settings: IndicatorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    /// Computes the indicator columns for every sample.
    ///
    /// Rows are returned in the input order. A value stays `None` until its
    /// window has seen enough history.
    ///
    /// # Errors
    ///
    /// * `Error::EmptyInput` if `samples` is empty.
    /// * `Error::InvalidClose` if a close price is NaN or infinite.
    /// * `Error::OutOfOrder` if timestamps go backwards.
    pub fn compute(&self, samples: &[PriceSample]) -> Result<Vec<AnnotatedSample>> {
        if samples.is_empty() {
            return Err(Error::EmptyInput);
        }

        let s = &self.settings;
        let mut sma = Sma::new(s.sma_window).map_err(invalid)?;
        let mut rsi = WilderRsi::new(s.rsi_window)?;
        let mut bands = BollingerBands::new(s.bollinger_window, s.bollinger_std_dev).map_err(invalid)?;
        let mut returns_sd = SampleStdDev::new(s.volatility_window)?;

        let mut rows = Vec::with_capacity(samples.len());
        let mut previous: Option<&PriceSample> = None;

        for (index, sample) in samples.iter().enumerate() {
            let close = sample.close;
            if !close.is_finite() {
                return Err(Error::InvalidClose { index, close });
            }
            if previous.is_some_and(|p| p.timestamp > sample.timestamp) {
                return Err(Error::OutOfOrder { index });
            }

            let seen = index + 1;
            let sma_value = sma.next(close);
            let rsi_value = rsi.next(close);
            let band = bands.next(close);

            // A zero previous close has no defined return; it is skipped
            // rather than fed into the window as infinity.
            let volatility = previous
                .filter(|p| p.close != 0.0)
                .and_then(|prev| returns_sd.next((close - prev.close) / prev.close))
                .map(|sd| sd * 100.0);

            let bands_ready = seen >= s.bollinger_window;
            let indicators = IndicatorSnapshot {
                sma: (seen >= s.sma_window).then_some(sma_value),
                rsi: rsi_value,
                volatility_pct: volatility,
                bollinger_upper: bands_ready.then_some(band.upper),
                bollinger_lower: bands_ready.then_some(band.lower),
            };

            rows.push(AnnotatedSample {
                sample: sample.clone(),
                indicators,
            });
            previous = Some(sample);
        }

        tracing::debug!(rows = rows.len(), "Computed indicators.");
        Ok(rows)
    }
}

fn invalid(err: ta::errors::TaError) -> Error {
    Error::InvalidParameter(format!("{:?}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn samples(closes: &[f64]) -> Vec<PriceSample> {
        let base = Utc.with_ymd_and_hms(2024, 5, 2, 13, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PriceSample::from_close(base + Duration::minutes(5 * i as i64), *close))
            .collect()
    }

    fn engine() -> IndicatorEngine {
        IndicatorEngine::new(IndicatorSettings::default()).unwrap()
    }

    #[test]
    fn sma_is_undefined_until_the_window_fills() {
        let closes: Vec<f64> = (1..=12).map(f64::from).collect();
        let rows = engine().compute(&samples(&closes)).unwrap();

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[8].indicators.sma, None);
        assert!((rows[9].indicators.sma.unwrap() - 5.5).abs() < 1e-9);
        assert!((rows[11].indicators.sma.unwrap() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn short_history_yields_undefined_values_not_zeros() {
        let rows = engine().compute(&samples(&[10.0, 10.5, 10.2])).unwrap();
        let last = rows.last().unwrap();

        assert_eq!(last.sample.close, 10.2);
        assert_eq!(last.indicators, IndicatorSnapshot::default());
    }

    #[test]
    fn rsi_appears_at_the_window_th_sample() {
        let closes: Vec<f64> = (1..=16).map(f64::from).collect();
        let rows = engine().compute(&samples(&closes)).unwrap();

        assert_eq!(rows[12].indicators.rsi, None);
        assert_eq!(rows[13].indicators.rsi, Some(100.0));

        let falling: Vec<f64> = (1..=16).rev().map(f64::from).collect();
        let rows = engine().compute(&samples(&falling)).unwrap();
        assert_eq!(rows[15].indicators.rsi, Some(0.0));
    }

    // Reference values: Wilder RSI(14) with averages seeded at the first
    // sample, and the sample standard deviation of 10 percent returns.
    const REFERENCE_CLOSES: [f64; 20] = [
        44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
        45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
    ];

    #[test]
    fn rsi_matches_wilder_reference_values() {
        let rows = engine().compute(&samples(&REFERENCE_CLOSES)).unwrap();
        let expected = [
            (13, 71.80241065373282),
            (14, 71.80241065373282),
            (15, 65.18659892527093),
            (17, 69.87561488969817),
            (19, 54.17929542054697),
        ];

        for (row, value) in expected {
            let rsi = rows[row].indicators.rsi.unwrap();
            assert!((rsi - value).abs() < 1e-9, "row {}: {} != {}", row, rsi, value);
        }
    }

    #[test]
    fn volatility_matches_sample_std_reference_values() {
        let rows = engine().compute(&samples(&REFERENCE_CLOSES)).unwrap();
        let expected = [(10, 0.8684350962401548), (13, 0.7930914556405649), (19, 0.8138600180445784)];

        assert_eq!(rows[9].indicators.volatility_pct, None);
        for (row, value) in expected {
            let vol = rows[row].indicators.volatility_pct.unwrap();
            assert!((vol - value).abs() < 1e-9, "row {}: {} != {}", row, vol, value);
        }
    }

    #[test]
    fn flat_prices_collapse_bands_and_volatility() {
        let rows = engine().compute(&samples(&[42.0; 25])).unwrap();

        assert_eq!(rows[18].indicators.bollinger_upper, None);
        let last = rows.last().unwrap().indicators;
        assert!((last.bollinger_upper.unwrap() - 42.0).abs() < 1e-6);
        assert!((last.bollinger_lower.unwrap() - 42.0).abs() < 1e-6);

        assert_eq!(rows[9].indicators.volatility_pct, None);
        assert!(rows[10].indicators.volatility_pct.unwrap().abs() < 1e-9);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(engine().compute(&[]), Err(Error::EmptyInput));
    }

    #[test]
    fn non_finite_close_is_rejected() {
        let err = engine().compute(&samples(&[1.0, f64::NAN, 2.0])).unwrap_err();
        assert!(matches!(err, Error::InvalidClose { index: 1, .. }));
    }

    #[test]
    fn timestamps_must_not_go_backwards() {
        let mut table = samples(&[1.0, 2.0, 3.0]);
        table.swap(0, 2);
        assert!(matches!(engine().compute(&table), Err(Error::OutOfOrder { index: 1 })));
    }

    #[test]
    fn zero_windows_cannot_build_an_engine() {
        let settings = IndicatorSettings {
            rsi_window: 0,
            ..IndicatorSettings::default()
        };
        assert!(matches!(IndicatorEngine::new(settings), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn volatility_needs_at_least_two_returns() {
        let settings = IndicatorSettings {
            volatility_window: 1,
            ..IndicatorSettings::default()
        };
        assert!(matches!(IndicatorEngine::new(settings), Err(Error::InvalidParameter(_))));
    }
}
