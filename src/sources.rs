//! External data-source contracts
//!
//! The engine never talks to a database. Collaborators implement these
//! traits over whatever store holds the raw series; the engine only
//! requires the agreed column set, hourly-alignable timestamps, and honest
//! NaN markers for gaps.

use crate::error::Result;
use crate::frame::FeatureFrame;
use crate::model::Building;
use chrono::{DateTime, Utc};

/// Forecast target column
pub const POWER_COLUMN: &str = "Power [kW]";
/// Cloud-coverage regressor column
pub const CLOUD_COLUMN: &str = "Cloud Coverage [%]";
/// Outdoor-temperature regressor column
pub const TEMPERATURE_COLUMN: &str = "Temperature [C]";
/// Occupancy regressor column
pub const OCCUPANCY_COLUMN: &str = "Occupancy";

/// Regressor columns, in contract order (the target precedes them in
/// historical frames)
pub const REGRESSOR_COLUMNS: [&str; 3] = [CLOUD_COLUMN, TEMPERATURE_COLUMN, OCCUPANCY_COLUMN];

/// Supplies the historical window: target plus every regressor column used
/// in training, covering `lookback_hours` up to `start`. Gaps are allowed.
pub trait HistoricalDataSource: Send + Sync {
    fn historical(
        &self,
        building: &Building,
        start: DateTime<Utc>,
        lookback_hours: usize,
    ) -> Result<FeatureFrame>;
}

/// Supplies known/forecast regressors for the future horizon, same columns
/// as the historical frame minus the target.
pub trait FutureRegressorSource: Send + Sync {
    fn future(
        &self,
        building: &Building,
        start: DateTime<Utc>,
        horizon_hours: usize,
    ) -> Result<FeatureFrame>;
}
