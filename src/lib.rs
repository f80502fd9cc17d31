//! Power Forecast - recursive building-load forecasting engine
//!
//! Forecasts hourly building power consumption from historical power,
//! weather, and occupancy series using a one-step sequence model invoked
//! recursively. The pipeline aligns raw series onto a strict hourly grid,
//! fills gaps by iterative multivariate imputation, derives calendar
//! features, removes the weekly trend by seasonal differencing, applies the
//! trained model's scaler parameters, runs the autoregressive loop, and
//! inverts every transform to reconstruct real-valued output.
//!
//! # Modules
//!
//! ## Core pipeline
//! - [`frame`] - Time series, feature frames, hourly-grid alignment
//! - [`imputation`] - Chained-equations imputation with a KNN estimator
//! - [`features`] - Cyclical calendar features and the weekend flag
//! - [`transforms`] - Seasonal differencing and its inverse
//! - [`scaling`] - Externally-fitted scaler parameters
//! - [`forecast`] - The recursive engine and its configuration
//!
//! ## Bindings
//! - [`model`] - Sequence-model capability, artifacts, building registry
//! - [`sources`] - Data-source contracts the engine requires of collaborators
//! - [`predictor`] - Facade compiling building + architecture + sources

pub mod error;

pub mod frame;
pub mod imputation;
pub mod features;
pub mod transforms;
pub mod scaling;
pub mod forecast;

pub mod model;
pub mod sources;
pub mod predictor;

pub use error::{ForecastError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ForecastError, Result};

    pub use crate::frame::{FeatureFrame, TimeSeries};
    pub use crate::imputation::IterativeImputer;
    pub use crate::features::{CalendarFeatures, WeekendPolarity};
    pub use crate::transforms::{SeasonalDifferencer, DEFAULT_SEASONAL_LAG};
    pub use crate::scaling::ScalerParams;
    pub use crate::forecast::{ForecastConfig, RecursiveForecaster, SlidingWindow};

    pub use crate::model::{
        load_scaler_params, Architecture, ArtifactConfig, Building, ModelArtifacts,
        SequenceModel,
    };
    pub use crate::sources::{FutureRegressorSource, HistoricalDataSource};
    pub use crate::predictor::Predictor;
}
