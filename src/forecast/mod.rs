//! Recursive forecasting: configuration and engine

mod engine;

pub use engine::{RecursiveForecaster, SlidingWindow};

use crate::error::{ForecastError, Result};
use crate::features::WeekendPolarity;
use crate::transforms::DEFAULT_SEASONAL_LAG;
use serde::{Deserialize, Serialize};

/// One day of hourly steps, the default forecast range
pub const DEFAULT_HORIZON: usize = 24;

/// Four weeks of hourly history, the default lookback
pub const DEFAULT_LOOKBACK: usize = 4 * 7 * 24;

/// Callback invoked after each recursive step with (completed, total).
/// Purely observational; the algorithm never depends on it.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Everything a forecast call needs beyond data and artifacts.
/// All knobs are explicit parameters, not global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Future hourly steps to forecast
    pub horizon: usize,
    /// Historical hours requested from the data source
    pub lookback: usize,
    /// Seasonal differencing lag in hours
    pub seasonal_lag: usize,
    /// Maximum imputation rounds
    pub impute_max_iter: usize,
    /// Imputation convergence tolerance
    pub impute_tolerance: f64,
    /// Imputation neighbor-count cap
    pub impute_max_neighbors: usize,
    /// Weekend-flag polarity the bound model was trained with
    pub weekend_polarity: WeekendPolarity,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            lookback: DEFAULT_LOOKBACK,
            seasonal_lag: DEFAULT_SEASONAL_LAG,
            impute_max_iter: 10,
            impute_tolerance: 1e-3,
            impute_max_neighbors: 30,
            weekend_polarity: WeekendPolarity::WeekdaysFlagged,
        }
    }
}

impl ForecastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_seasonal_lag(mut self, lag: usize) -> Self {
        self.seasonal_lag = lag;
        self
    }

    pub fn with_weekend_polarity(mut self, polarity: WeekendPolarity) -> Self {
        self.weekend_polarity = polarity;
        self
    }

    /// Reject configurations that cannot produce a forecast.
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::ConfigError(
                "forecast horizon must be positive".to_string(),
            ));
        }
        if self.lookback == 0 {
            return Err(ForecastError::ConfigError(
                "historical lookback must be positive".to_string(),
            ));
        }
        if self.seasonal_lag == 0 {
            return Err(ForecastError::ConfigError(
                "seasonal lag must be positive".to_string(),
            ));
        }
        if self.lookback <= self.seasonal_lag {
            return Err(ForecastError::ConfigError(format!(
                "lookback of {} hours must exceed the seasonal lag of {}",
                self.lookback, self.seasonal_lag
            )));
        }
        Ok(())
    }
}
