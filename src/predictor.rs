//! Predictor facade
//!
//! Compiles a building, an architecture's trained artifacts, and the data
//! sources into a single forecast entry point, mirroring how a service
//! binds one model per building.

use crate::error::Result;
use crate::forecast::{ForecastConfig, RecursiveForecaster};
use crate::frame::{FeatureFrame, TimeSeries};
use crate::model::{Architecture, ArtifactConfig, Building, ModelArtifacts};
use crate::sources::{FutureRegressorSource, HistoricalDataSource};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Binds building + architecture + sources and exposes `forecast`
pub struct Predictor {
    building: Building,
    artifacts: ModelArtifacts,
    config: ForecastConfig,
    historical_source: Box<dyn HistoricalDataSource>,
    future_source: Box<dyn FutureRegressorSource>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("building", &self.building.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Predictor {
    /// Load the building's artifacts through the architecture and wire up
    /// the data sources.
    pub fn new(
        architecture: &dyn Architecture,
        building: Building,
        artifact_config: &ArtifactConfig,
        config: ForecastConfig,
        historical_source: Box<dyn HistoricalDataSource>,
        future_source: Box<dyn FutureRegressorSource>,
    ) -> Result<Self> {
        config.validate()?;
        let artifacts = architecture.load(&building, artifact_config)?;
        info!(
            building = building.name(),
            architecture = architecture.name(),
            "predictor ready"
        );
        Ok(Self {
            building,
            artifacts,
            config,
            historical_source,
            future_source,
        })
    }

    pub fn building(&self) -> &Building {
        &self.building
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast power consumption from `start`.
    ///
    /// `future_range` overrides the configured horizon for this call; when
    /// `None`, the configured horizon (one day by default) applies.
    pub fn forecast(
        &self,
        start: DateTime<Utc>,
        future_range: Option<usize>,
    ) -> Result<TimeSeries> {
        let config = self.call_config(future_range);
        let historical =
            self.historical_source
                .historical(&self.building, start, config.lookback)?;
        let future = self
            .future_source
            .future(&self.building, start, config.horizon)?;
        self.run(config, &historical, &future)
    }

    /// Forecast with caller-supplied frames, bypassing the data sources.
    pub fn forecast_with_frames(
        &self,
        historical: &FeatureFrame,
        future: &FeatureFrame,
        future_range: Option<usize>,
    ) -> Result<TimeSeries> {
        let config = self.call_config(future_range);
        self.run(config, historical, future)
    }

    fn call_config(&self, future_range: Option<usize>) -> ForecastConfig {
        let mut config = self.config.clone();
        if let Some(hours) = future_range {
            config.horizon = hours;
        }
        config
    }

    fn run(
        &self,
        config: ForecastConfig,
        historical: &FeatureFrame,
        future: &FeatureFrame,
    ) -> Result<TimeSeries> {
        let forecaster = RecursiveForecaster::new(
            config,
            Arc::clone(&self.artifacts.model),
            self.artifacts.scaler.clone(),
        )?;
        forecaster.forecast(historical, future)
    }
}
