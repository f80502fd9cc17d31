//! Iterative multivariate (chained-equations) imputation over a window

use crate::error::{ForecastError, Result};
use crate::frame::FeatureFrame;
use crate::imputation::{is_missing, KnnRegressor};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Iterative imputer with an adaptive KNN estimator.
///
/// Each round regresses every incomplete column against all the others and
/// refills its missing cells; rounds repeat until the filled values stop
/// changing materially or the round limit is reached. A synthetic
/// elapsed-days covariate anchors the regression against slow temporal
/// drift across the window, and all columns are standardized with
/// window-local statistics first (this is a local fit, independent of the
/// trained model's scaler parameters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterativeImputer {
    /// Maximum chained-equations rounds
    max_iter: usize,
    /// Convergence threshold on the total absolute change per round
    tol: f64,
    /// Upper bound on the neighbor count; the per-column k never exceeds
    /// the number of rows where that column is observed
    max_neighbors: usize,
}

impl IterativeImputer {
    pub fn new() -> Self {
        Self {
            max_iter: 10,
            tol: 1e-3,
            max_neighbors: 30,
        }
    }

    /// Set the maximum number of rounds
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol.max(1e-12);
        self
    }

    /// Set the neighbor-count cap
    pub fn with_max_neighbors(mut self, n: usize) -> Self {
        self.max_neighbors = n.max(1);
        self
    }

    /// Fill every missing cell in the frame.
    ///
    /// Fails before any imputation work if a column has no observed value at
    /// all, since such a column gives the estimator no signal.
    pub fn impute(&self, frame: &FeatureFrame) -> Result<FeatureFrame> {
        if frame.is_empty() {
            return Err(ForecastError::DataError(
                "cannot impute an empty frame".to_string(),
            ));
        }

        // Non-negotiable pre-check: reject before touching any cell
        for (j, name) in frame.columns().iter().enumerate() {
            if frame.column(j).iter().all(|&v| is_missing(v)) {
                return Err(ForecastError::DataError(format!(
                    "column entirely missing: '{}'",
                    name
                )));
            }
        }

        if !frame.values().iter().any(|&v| is_missing(v)) {
            return Ok(frame.clone());
        }

        let n_rows = frame.n_rows();
        let n_cols = frame.n_cols();

        // Working matrix with the elapsed-days covariate appended on the right
        let base_date = frame.index()[0];
        let mut work = Array2::from_elem((n_rows, n_cols + 1), f64::NAN);
        work.slice_mut(ndarray::s![.., ..n_cols]).assign(frame.values());
        for (i, ts) in frame.index().iter().enumerate() {
            work[[i, n_cols]] = (*ts - base_date).num_days() as f64;
        }

        // Window-local standardization over observed cells
        let (means, stds) = local_moments(&work);
        for j in 0..work.ncols() {
            for i in 0..n_rows {
                let v = work[[i, j]];
                if !is_missing(v) {
                    work[[i, j]] = (v - means[j]) / stds[j];
                }
            }
        }

        // Missing masks from the original data; the covariate is complete
        let missing_rows: Vec<Vec<usize>> = (0..work.ncols())
            .map(|j| {
                (0..n_rows)
                    .filter(|&i| is_missing(work[[i, j]]))
                    .collect()
            })
            .collect();
        let observed_rows: Vec<Vec<usize>> = (0..work.ncols())
            .map(|j| {
                (0..n_rows)
                    .filter(|&i| !is_missing(work[[i, j]]))
                    .collect()
            })
            .collect();

        // Initial fill with the observed column mean (in standardized space)
        for j in 0..work.ncols() {
            if missing_rows[j].is_empty() {
                continue;
            }
            let sum: f64 = observed_rows[j].iter().map(|&i| work[[i, j]]).sum();
            let fill = sum / observed_rows[j].len() as f64;
            for &i in &missing_rows[j] {
                work[[i, j]] = fill;
            }
        }

        // Chained-equations rounds
        for round in 0..self.max_iter {
            let total_change = self.round(&mut work, &missing_rows, &observed_rows)?;
            debug!(round, total_change, "imputation round complete");
            if total_change < self.tol {
                break;
            }
        }

        // Invert the local standardization and drop the covariate
        let mut result = Array2::zeros((n_rows, n_cols));
        for j in 0..n_cols {
            for i in 0..n_rows {
                result[[i, j]] = work[[i, j]] * stds[j] + means[j];
            }
        }

        FeatureFrame::new(
            frame.index().to_vec(),
            frame.columns().to_vec(),
            result,
        )
    }

    /// One pass over every incomplete column. Returns the total absolute
    /// change across all refilled cells.
    fn round(
        &self,
        work: &mut Array2<f64>,
        missing_rows: &[Vec<usize>],
        observed_rows: &[Vec<usize>],
    ) -> Result<f64> {
        let n_features = work.ncols();
        let mut total_change = 0.0;

        for target_col in 0..n_features {
            let missing = &missing_rows[target_col];
            if missing.is_empty() {
                continue;
            }
            let observed = &observed_rows[target_col];

            let feature_cols: Vec<usize> =
                (0..n_features).filter(|&c| c != target_col).collect();

            let mut x_train = Array2::zeros((observed.len(), feature_cols.len()));
            let mut y_train = Array1::zeros(observed.len());
            for (i, &row) in observed.iter().enumerate() {
                for (j, &col) in feature_cols.iter().enumerate() {
                    x_train[[i, j]] = work[[row, col]];
                }
                y_train[i] = work[[row, target_col]];
            }

            let mut x_test = Array2::zeros((missing.len(), feature_cols.len()));
            for (i, &row) in missing.iter().enumerate() {
                for (j, &col) in feature_cols.iter().enumerate() {
                    x_test[[i, j]] = work[[row, col]];
                }
            }

            // k follows the observed-row count, capped
            let k = self.max_neighbors.min(observed.len());
            let knn = KnnRegressor::fit(k, x_train, y_train)?;
            let predictions = knn.predict(&x_test);

            for (i, &row) in missing.iter().enumerate() {
                let old = work[[row, target_col]];
                let new = predictions[i];
                work[[row, target_col]] = new;
                total_change += (new - old).abs();
            }
        }

        Ok(total_change)
    }
}

impl Default for IterativeImputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-column mean and standard deviation over observed cells.
/// A constant column gets a unit scale so standardization stays invertible.
fn local_moments(data: &Array2<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut means = Vec::with_capacity(data.ncols());
    let mut stds = Vec::with_capacity(data.ncols());

    for j in 0..data.ncols() {
        let observed: Vec<f64> = data
            .column(j)
            .iter()
            .filter(|v| !is_missing(**v))
            .copied()
            .collect();

        let mean = if observed.is_empty() {
            0.0
        } else {
            observed.iter().sum::<f64>() / observed.len() as f64
        };
        let variance = if observed.is_empty() {
            0.0
        } else {
            observed.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / observed.len() as f64
        };
        let std = variance.sqrt();

        means.push(mean);
        stds.push(if std == 0.0 { 1.0 } else { std });
    }

    (means, stds)
}
