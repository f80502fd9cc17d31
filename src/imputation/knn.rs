//! K-nearest-neighbors regression, the estimator behind iterative imputation

use crate::error::{ForecastError, Result};
use crate::imputation::is_missing;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered (distance, index) pair for the bounded neighbor heap
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max heap by distance so the worst neighbor is evicted first
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Uniform-weight k-nearest-neighbors regressor
#[derive(Debug, Clone)]
pub struct KnnRegressor {
    n_neighbors: usize,
    x_train: Array2<f64>,
    y_train: Array1<f64>,
}

impl KnnRegressor {
    /// Fit on a training matrix and target vector.
    ///
    /// The effective neighbor count is clamped to the number of training
    /// rows, so a small window can never request more neighbors than exist.
    pub fn fit(n_neighbors: usize, x_train: Array2<f64>, y_train: Array1<f64>) -> Result<Self> {
        if x_train.nrows() == 0 {
            return Err(ForecastError::DataError(
                "KNN regressor requires at least one training row".to_string(),
            ));
        }
        if x_train.nrows() != y_train.len() {
            return Err(ForecastError::DataError(format!(
                "KNN training matrix has {} rows but target has {} values",
                x_train.nrows(),
                y_train.len()
            )));
        }

        Ok(Self {
            n_neighbors: n_neighbors.max(1).min(x_train.nrows()),
            x_train,
            y_train,
        })
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Mean per-dimension euclidean distance, skipping missing positions.
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut count = 0usize;
        let mut accum = 0.0f64;

        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            let d = ai - bi;
            accum += d * d;
            count += 1;
        }

        if count == 0 {
            return f64::INFINITY;
        }
        (accum / count as f64).sqrt()
    }

    /// Predict one sample as the uniform mean of its k nearest neighbors.
    pub fn predict_one(&self, sample: &[f64]) -> f64 {
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(self.n_neighbors + 1);

        for (i, row) in self.x_train.rows().into_iter().enumerate() {
            let dist = match row.as_slice() {
                Some(slice) => Self::distance(sample, slice),
                None => {
                    let row_vec: Vec<f64> = row.iter().copied().collect();
                    Self::distance(sample, &row_vec)
                }
            };

            if !dist.is_finite() {
                continue;
            }
            if heap.len() < self.n_neighbors {
                heap.push(DistanceIdx(dist, i));
            } else if let Some(&DistanceIdx(worst, _)) = heap.peek() {
                if dist < worst {
                    heap.pop();
                    heap.push(DistanceIdx(dist, i));
                }
            }
        }

        if heap.is_empty() {
            // No comparable neighbor at all; fall back to the global mean
            return self.y_train.mean().unwrap_or(0.0);
        }

        let sum: f64 = heap.iter().map(|&DistanceIdx(_, i)| self.y_train[i]).sum();
        sum / heap.len() as f64
    }

    /// Predict a batch of samples, one per row.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        let rows: Vec<Vec<f64>> = x
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        let predictions: Vec<f64> = rows.par_iter().map(|row| self.predict_one(row)).collect();

        Array1::from_vec(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_neighbor() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let y = Array1::from_vec(vec![10.0, 20.0, 30.0, 40.0]);

        let knn = KnnRegressor::fit(1, x, y).unwrap();
        assert!((knn.predict_one(&[1.0]) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_neighbor_mean() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 10.0, 11.0]).unwrap();
        let y = Array1::from_vec(vec![0.0, 2.0, 100.0, 102.0]);

        let knn = KnnRegressor::fit(2, x, y).unwrap();
        // Nearest two to 0.5 are rows 0 and 1
        assert!((knn.predict_one(&[0.5]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_clamped_to_rows() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let y = Array1::from_vec(vec![4.0, 6.0]);

        let knn = KnnRegressor::fit(30, x, y).unwrap();
        assert_eq!(knn.n_neighbors(), 2);
        assert!((knn.predict_one(&[0.5]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_matches_single() {
        let x = Array2::from_shape_vec((3, 2), vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]).unwrap();
        let y = Array1::from_vec(vec![1.0, 2.0, 3.0]);
        let knn = KnnRegressor::fit(2, x, y).unwrap();

        let queries = Array2::from_shape_vec((2, 2), vec![0.1, 0.1, 1.9, 1.9]).unwrap();
        let batch = knn.predict(&queries);
        assert!((batch[0] - knn.predict_one(&[0.1, 0.1])).abs() < 1e-12);
        assert!((batch[1] - knn.predict_one(&[1.9, 1.9])).abs() < 1e-12);
    }

    #[test]
    fn test_empty_training_rejected() {
        let x = Array2::zeros((0, 2));
        let y = Array1::zeros(0);
        assert!(KnnRegressor::fit(3, x, y).is_err());
    }
}
