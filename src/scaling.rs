//! Externally-fitted feature scaling
//!
//! The per-column (mean, std) pairs are produced at training time and loaded
//! as a read-only artifact; the engine only applies them and their inverse.
//! Column order is the feature contract with the trained model and must
//! survive every transform unchanged.

use crate::error::{ForecastError, Result};
use crate::frame::FeatureFrame;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Per-column standardization parameters fixed at training time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawScalerParams")]
pub struct ScalerParams {
    mean: Vec<f64>,
    std: Vec<f64>,
}

/// Wire form of the scaler artifact, validated on the way in
#[derive(Debug, Deserialize)]
struct RawScalerParams {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl TryFrom<RawScalerParams> for ScalerParams {
    type Error = ForecastError;

    fn try_from(raw: RawScalerParams) -> Result<Self> {
        ScalerParams::new(raw.mean, raw.std)
    }
}

impl ScalerParams {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        if mean.is_empty() {
            return Err(ForecastError::ConfigError(
                "scaler parameters must cover at least one column".to_string(),
            ));
        }
        if mean.len() != std.len() {
            return Err(ForecastError::ConfigError(format!(
                "scaler mean has {} entries but std has {}",
                mean.len(),
                std.len()
            )));
        }
        if std.iter().any(|&s| !(s > 0.0)) {
            return Err(ForecastError::ConfigError(
                "scaler std entries must be positive".to_string(),
            ));
        }
        Ok(Self { mean, std })
    }

    /// Identity parameters (mean 0, std 1) for the given column count
    pub fn identity(n_columns: usize) -> Result<Self> {
        Self::new(vec![0.0; n_columns], vec![1.0; n_columns])
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Parameters for a frame that does not carry the target column
    /// (entry 0 dropped).
    pub fn without_target(&self) -> Result<ScalerParams> {
        if self.len() < 2 {
            return Err(ForecastError::ConfigError(
                "scaler parameters carry no regressor entries".to_string(),
            ));
        }
        ScalerParams::new(self.mean[1..].to_vec(), self.std[1..].to_vec())
    }

    /// Apply `(x − mean) / std` column-wise.
    pub fn transform(&self, frame: &FeatureFrame) -> Result<FeatureFrame> {
        if frame.n_cols() != self.len() {
            return Err(ForecastError::ConfigError(format!(
                "frame has {} columns but scaler parameters cover {}",
                frame.n_cols(),
                self.len()
            )));
        }

        let mut values = frame.values().clone();
        for j in 0..values.ncols() {
            let mean = self.mean[j];
            let std = self.std[j];
            values.column_mut(j).mapv_inplace(|v| (v - mean) / std);
        }

        FeatureFrame::new(frame.index().to_vec(), frame.columns().to_vec(), values)
    }

    /// Invert the scaling of the target column only (entry 0), for the
    /// predicted values coming out of the recursive loop.
    pub fn inverse_target(&self, values: &Array1<f64>) -> Array1<f64> {
        let mean = self.mean[0];
        let std = self.std[0];
        values.mapv(|v| v * std + mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::Array2;

    fn small_frame() -> FeatureFrame {
        let base = Utc.with_ymd_and_hms(2019, 11, 11, 0, 0, 0).unwrap();
        FeatureFrame::new(
            vec![base, base + chrono::Duration::hours(1)],
            vec!["Power [kW]".to_string(), "Temperature [C]".to_string()],
            Array2::from_shape_vec((2, 2), vec![10.0, 20.0, 30.0, 40.0]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_transform_and_inverse_target() {
        let params = ScalerParams::new(vec![10.0, 20.0], vec![2.0, 4.0]).unwrap();
        let scaled = params.transform(&small_frame()).unwrap();

        assert!((scaled.values()[[0, 0]] - 0.0).abs() < 1e-12);
        assert!((scaled.values()[[1, 0]] - 10.0).abs() < 1e-12);
        assert!((scaled.values()[[0, 1]] - 0.0).abs() < 1e-12);
        assert!((scaled.values()[[1, 1]] - 5.0).abs() < 1e-12);

        let restored = params.inverse_target(&scaled.column(0).to_owned());
        assert!((restored[0] - 10.0).abs() < 1e-12);
        assert!((restored[1] - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let params = ScalerParams::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        assert!(matches!(
            params.transform(&small_frame()),
            Err(ForecastError::ConfigError(_))
        ));
    }

    #[test]
    fn test_without_target_drops_first_entry() {
        let params = ScalerParams::new(vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]).unwrap();
        let regressors = params.without_target().unwrap();
        assert_eq!(regressors.len(), 2);
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(ScalerParams::new(vec![0.0], vec![0.0]).is_err());
        assert!(ScalerParams::new(vec![0.0, 1.0], vec![1.0]).is_err());
        assert!(ScalerParams::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let ok: ScalerParams =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "std": [0.5, 0.5]}"#).unwrap();
        assert_eq!(ok.len(), 2);

        let bad: std::result::Result<ScalerParams, _> =
            serde_json::from_str(r#"{"mean": [1.0, 2.0], "std": [0.5]}"#);
        assert!(bad.is_err());
    }
}
