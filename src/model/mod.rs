//! Sequence-model capability and trained-artifact bindings
//!
//! The engine consumes a trained model through two opaque capabilities:
//! "predict one step given a window" ([`SequenceModel`]) and "scaler
//! parameters per feature" ([`crate::scaling::ScalerParams`]). How the
//! weights themselves are deserialized is an [`Architecture`] concern and
//! stays outside the forecasting core.

mod artifacts;
mod registry;

pub use artifacts::{load_scaler_params, Architecture, ArtifactConfig, ModelArtifacts};
pub use registry::Building;

use crate::error::Result;
use ndarray::ArrayView2;

/// One-step-ahead sequence model.
///
/// Given a fixed-shape window of recent feature rows (timesteps × features,
/// scaled and differenced), returns the predicted scaled, differenced target
/// value for the next hour. Implementations hold no per-call state: the
/// caller owns the sliding window, so one loaded model may serve concurrent
/// forecasts read-only.
pub trait SequenceModel: Send + Sync {
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64>;
}
