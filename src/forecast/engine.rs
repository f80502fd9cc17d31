//! The recursive forecasting engine
//!
//! Chains alignment, imputation, calendar features, seasonal differencing,
//! and scaling around the autoregressive loop, then inverts the transforms
//! to reconstruct real-valued output. The loop is a hard sequential
//! dependency chain: the prediction at step `i` becomes model input at step
//! `i + 1`, so there is no intra-forecast parallelism; independent forecasts
//! are free to run concurrently against the same read-only artifacts.

use crate::error::{ForecastError, Result};
use crate::features::CalendarFeatures;
use crate::forecast::{ForecastConfig, ProgressCallback};
use crate::frame::{FeatureFrame, TimeSeries};
use crate::imputation::IterativeImputer;
use crate::model::SequenceModel;
use crate::scaling::ScalerParams;
use crate::transforms::SeasonalDifferencer;
use ndarray::{Array1, Array2, ArrayView2};
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed-size trailing block of feature rows fed to the model each step.
///
/// The shape is set once from the seed and never changes; sliding drops the
/// oldest row and appends the newest.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    values: Array2<f64>,
}

impl SlidingWindow {
    pub fn new(seed: Array2<f64>) -> Result<Self> {
        if seed.nrows() == 0 || seed.ncols() == 0 {
            return Err(ForecastError::DataError(
                "sliding window seed must have at least one row and column".to_string(),
            ));
        }
        Ok(Self { values: seed })
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Drop the oldest row and append `row` as the newest.
    pub fn slide(&mut self, row: &Array1<f64>) -> Result<()> {
        if row.len() != self.n_cols() {
            return Err(ForecastError::DataError(format!(
                "window rows carry {} features, new row has {}",
                self.n_cols(),
                row.len()
            )));
        }

        let n = self.values.nrows();
        for r in 0..n - 1 {
            let next = self.values.row(r + 1).to_owned();
            self.values.row_mut(r).assign(&next);
        }
        self.values.row_mut(n - 1).assign(row);
        Ok(())
    }
}

/// End-to-end multi-step forecaster around a one-step sequence model
pub struct RecursiveForecaster {
    config: ForecastConfig,
    model: Arc<dyn SequenceModel>,
    scaler: ScalerParams,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for RecursiveForecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveForecaster")
            .field("config", &self.config)
            .field("scaler_columns", &self.scaler.len())
            .finish()
    }
}

impl RecursiveForecaster {
    pub fn new(
        config: ForecastConfig,
        model: Arc<dyn SequenceModel>,
        scaler: ScalerParams,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model,
            scaler,
            progress: None,
        })
    }

    /// Attach a progress callback invoked after every recursive step.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Produce the multi-step power forecast.
    ///
    /// `historical` carries the target (column 0) plus all regressors;
    /// `future` carries the same regressors, no target, and must cover the
    /// configured horizon. Either frame may contain gaps; both are aligned
    /// and imputed independently. Any failure aborts the whole forecast;
    /// no partial result is ever returned.
    pub fn forecast(
        &self,
        historical: &FeatureFrame,
        future: &FeatureFrame,
    ) -> Result<TimeSeries> {
        let lag = self.config.seasonal_lag;
        let horizon = self.config.horizon;
        let target_name = historical
            .columns()
            .first()
            .cloned()
            .ok_or_else(|| {
                ForecastError::DataError("historical frame has no columns".to_string())
            })?;

        let hist = historical.align_hourly()?;
        let fut = future.align_hourly()?;
        self.check_columns(&hist, &fut)?;

        if fut.n_rows() < horizon {
            return Err(ForecastError::DataError(format!(
                "future frame covers {} hours but the horizon is {}",
                fut.n_rows(),
                horizon
            )));
        }
        let fut = fut.head(horizon)?;

        // Impute each window on its own; the future window never holds the
        // target, so its regression pool is just the regressors.
        let imputer = IterativeImputer::new()
            .with_max_iter(self.config.impute_max_iter)
            .with_tolerance(self.config.impute_tolerance)
            .with_max_neighbors(self.config.impute_max_neighbors);
        let mut hist = imputer.impute(&hist)?;
        let mut fut = imputer.impute(&fut)?;

        let calendar = CalendarFeatures::new(self.config.weekend_polarity);
        calendar.append(&mut hist)?;
        calendar.append(&mut fut)?;

        // Difference the target and keep the raw tail for reconstruction
        let target = hist.column(0).to_owned();
        let differencer = SeasonalDifferencer::new(lag);
        let base = differencer.base_window(&target)?;
        let diffed = differencer.transform(&target)?;

        // The first `lag` rows have no difference defined; drop them and
        // substitute the differenced target
        let mut hist = hist.tail(lag)?;
        hist.set_column(0, &diffed)?;

        let scaled_hist = self.scaler.transform(&hist)?;
        let scaled_fut = self.scaler.without_target()?.transform(&fut)?;

        let mut window = SlidingWindow::new(scaled_hist.values().clone())?;
        info!(
            horizon,
            window_rows = window.n_rows(),
            features = window.n_cols(),
            "starting recursive forecast"
        );

        // The autoregressive loop: strictly sequential, each prediction
        // becomes part of the next window
        let mut predictions = Array1::zeros(horizon);
        for step in 0..horizon {
            let predicted = self.model.predict(window.view())?;
            if !predicted.is_finite() {
                return Err(ForecastError::ModelError(format!(
                    "model returned a non-finite value at step {} of {}",
                    step + 1,
                    horizon
                )));
            }
            predictions[step] = predicted;

            let mut next = Array1::zeros(window.n_cols());
            next[0] = predicted;
            for (j, &v) in scaled_fut.row(step).iter().enumerate() {
                next[j + 1] = v;
            }
            window.slide(&next)?;

            debug!(step = step + 1, horizon, "recursive step complete");
            if let Some(callback) = &self.progress {
                callback(step + 1, horizon);
            }
        }

        // Reconstruction: unscale the target entry, then walk the inverse
        // difference forward from the base window. The inverse yields
        // exactly `horizon` values, so the result is already trimmed.
        let raw_diffs = self.scaler.inverse_target(&predictions);
        let absolute = differencer.inverse(&raw_diffs, &base)?;

        info!(horizon, "forecast complete");
        TimeSeries::new(target_name, fut.index().to_vec(), absolute.to_vec())
    }

    /// The future frame must carry exactly the historical regressor columns,
    /// same names, same order, no target.
    fn check_columns(&self, hist: &FeatureFrame, fut: &FeatureFrame) -> Result<()> {
        if fut.n_cols() + 1 != hist.n_cols() {
            return Err(ForecastError::DataError(format!(
                "historical frame has {} columns; future frame must carry its {} regressors, got {}",
                hist.n_cols(),
                hist.n_cols() - 1,
                fut.n_cols()
            )));
        }
        for (h, f) in hist.columns()[1..].iter().zip(fut.columns()) {
            if h != f {
                return Err(ForecastError::DataError(format!(
                    "regressor columns disagree: historical '{}' vs future '{}'",
                    h, f
                )));
            }
        }
        Ok(())
    }
}
