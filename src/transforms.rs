//! Seasonal differencing of the forecast target
//!
//! Subtracting the value one full season earlier (one week = 168 hours for
//! hourly building load) removes the weekly trend before modeling. The
//! inverse walk is strictly sequential: reconstructing step `t` needs step
//! `t - lag` to be resolved already, which the base window guarantees for
//! the first `lag` steps.

use crate::error::{ForecastError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One week of hourly observations, the default seasonal lag
pub const DEFAULT_SEASONAL_LAG: usize = 7 * 24;

/// Fixed-lag seasonal differencer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeasonalDifferencer {
    lag: usize,
}

impl SeasonalDifferencer {
    pub fn new(lag: usize) -> Self {
        Self { lag: lag.max(1) }
    }

    pub fn lag(&self) -> usize {
        self.lag
    }

    /// `diff[t] = value[t] − value[t − lag]`, with the first `lag` entries
    /// dropped (they have no lag predecessor).
    pub fn transform(&self, series: &Array1<f64>) -> Result<Array1<f64>> {
        let n = series.len();
        if n <= self.lag {
            return Err(ForecastError::DataError(format!(
                "series of {} values is not longer than the seasonal lag {}",
                n, self.lag
            )));
        }

        let mut result = Array1::zeros(n - self.lag);
        for t in self.lag..n {
            result[t - self.lag] = series[t] - series[t - self.lag];
        }
        Ok(result)
    }

    /// The last `lag` raw values of the series, kept to seed the inverse.
    pub fn base_window(&self, series: &Array1<f64>) -> Result<Array1<f64>> {
        let n = series.len();
        if n < self.lag {
            return Err(ForecastError::DataError(format!(
                "need at least {} values for a base window, got {}",
                self.lag, n
            )));
        }
        Ok(series.slice(ndarray::s![n - self.lag..]).to_owned())
    }

    /// Reconstruct absolute values from predicted differences.
    ///
    /// Walks the horizon in index order, adding each difference to the
    /// resolved value one lag earlier; the base window supplies the first
    /// `lag` resolved entries. Returns only the reconstructed continuation.
    pub fn inverse(&self, diffs: &Array1<f64>, base: &Array1<f64>) -> Result<Array1<f64>> {
        if base.len() != self.lag {
            return Err(ForecastError::DataError(format!(
                "base window has {} values, seasonal lag is {}",
                base.len(),
                self.lag
            )));
        }

        let n = diffs.len();
        let mut result = Array1::zeros(n);
        for k in 0..n {
            let anchor = if k < self.lag {
                base[k]
            } else {
                result[k - self.lag]
            };
            result[k] = diffs[k] + anchor;
        }
        Ok(result)
    }
}

impl Default for SeasonalDifferencer {
    fn default() -> Self {
        Self::new(DEFAULT_SEASONAL_LAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let lag = 5;
        let diff = SeasonalDifferencer::new(lag);
        let series = Array1::from_vec(
            (0..23).map(|i| (i as f64 * 0.7).sin() * 10.0 + i as f64).collect(),
        );

        let diffed = diff.transform(&series).unwrap();
        assert_eq!(diffed.len(), series.len() - lag);

        let base = series.slice(ndarray::s![..lag]).to_owned();
        let recovered = diff.inverse(&diffed, &base).unwrap();

        for (k, &v) in recovered.iter().enumerate() {
            assert!((v - series[lag + k]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_differences_accumulate() {
        // With a constant base and constant predicted difference c, step k
        // reconstructs to base + c * (1 + k / lag): one more c per full lag.
        let diff = SeasonalDifferencer::new(3);
        let base = Array1::from_vec(vec![10.0, 10.0, 10.0]);
        let preds = Array1::from_vec(vec![2.0, 2.0, 2.0, 2.0]);

        let out = diff.inverse(&preds, &base).unwrap();
        assert_eq!(out.to_vec(), vec![12.0, 12.0, 12.0, 14.0]);
    }

    #[test]
    fn test_series_not_longer_than_lag_rejected() {
        let diff = SeasonalDifferencer::new(10);
        let series = Array1::from_vec(vec![1.0; 10]);
        assert!(matches!(
            diff.transform(&series),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_base_window_is_tail() {
        let diff = SeasonalDifferencer::new(3);
        let series = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let base = diff.base_window(&series).unwrap();
        assert_eq!(base.to_vec(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_mismatched_base_rejected() {
        let diff = SeasonalDifferencer::new(4);
        let base = Array1::from_vec(vec![1.0, 2.0]);
        let preds = Array1::from_vec(vec![0.5; 6]);
        assert!(diff.inverse(&preds, &base).is_err());
    }
}
