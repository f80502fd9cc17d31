//! Integration tests for data preparation and the predictor facade

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::{Array1, Array2, ArrayView2};
use power_forecast::prelude::*;
use power_forecast::sources::{OCCUPANCY_COLUMN, POWER_COLUMN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::sync::Arc;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 11, 11, 0, 0, 0).unwrap()
}

fn hourly(from: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    (0..n).map(|i| from + Duration::hours(i as i64)).collect()
}

// ============================================================================
// Alignment + imputation + feature chain
// ============================================================================

#[test]
fn test_prepare_chain_fills_and_engineers() {
    let n = 72;
    let mut rng = StdRng::seed_from_u64(42);

    let mut power = Vec::with_capacity(n);
    let mut occupancy = Vec::with_capacity(n);
    for i in 0..n {
        let daily = (2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0).sin();
        power.push(100.0 + 20.0 * daily + rng.gen::<f64>());
        occupancy.push(50.0 + 30.0 * daily + rng.gen::<f64>());
    }
    // Punch random holes, leaving plenty observed
    for _ in 0..10 {
        let row = rng.gen_range(0..n);
        power[row] = f64::NAN;
        let row = rng.gen_range(0..n);
        occupancy[row] = f64::NAN;
    }

    let mut values = Vec::with_capacity(n * 2);
    for i in 0..n {
        values.push(power[i]);
        values.push(occupancy[i]);
    }
    let frame = FeatureFrame::new(
        hourly(base_time(), n),
        vec![POWER_COLUMN.to_string(), OCCUPANCY_COLUMN.to_string()],
        Array2::from_shape_vec((n, 2), values).unwrap(),
    )
    .unwrap();

    let aligned = frame.align_hourly().unwrap();
    let mut imputed = IterativeImputer::new().impute(&aligned).unwrap();
    assert!(!imputed.values().iter().any(|&v| v.is_nan()));

    CalendarFeatures::default().append(&mut imputed).unwrap();
    assert_eq!(imputed.n_cols(), 7);
    assert_eq!(imputed.columns()[2], "sin(day)");
    assert_eq!(imputed.columns()[6], "weekend");

    // Imputed values stay inside the observed band
    for j in 0..2 {
        for &v in imputed.column(j).iter() {
            assert!(v > 0.0 && v < 200.0);
        }
    }
}

#[test]
fn test_imputer_rejects_dead_column_before_work() {
    let n = 24;
    let mut values = Vec::with_capacity(n * 2);
    for i in 0..n {
        values.push(i as f64);
        values.push(f64::NAN);
    }
    let frame = FeatureFrame::new(
        hourly(base_time(), n),
        vec![POWER_COLUMN.to_string(), OCCUPANCY_COLUMN.to_string()],
        Array2::from_shape_vec((n, 2), values).unwrap(),
    )
    .unwrap();

    let err = IterativeImputer::new().impute(&frame).unwrap_err();
    assert!(matches!(err, ForecastError::DataError(_)));
}

// ============================================================================
// Differencing at the production lag
// ============================================================================

#[test]
fn test_weekly_lag_round_trip() {
    let lag = DEFAULT_SEASONAL_LAG;
    let n = lag + 240;
    let mut rng = StdRng::seed_from_u64(7);

    let series = Array1::from_vec(
        (0..n)
            .map(|i| {
                let weekly = (2.0 * std::f64::consts::PI * i as f64 / lag as f64).sin();
                200.0 + 50.0 * weekly + rng.gen::<f64>()
            })
            .collect(),
    );

    let differencer = SeasonalDifferencer::new(lag);
    let diffed = differencer.transform(&series).unwrap();
    assert_eq!(diffed.len(), n - lag);

    let base = series.slice(ndarray::s![..lag]).to_owned();
    let recovered = differencer.inverse(&diffed, &base).unwrap();
    for (k, &v) in recovered.iter().enumerate() {
        assert!((v - series[lag + k]).abs() < 1e-9);
    }
}

// ============================================================================
// Predictor facade with stubbed architecture and sources
// ============================================================================

struct ConstantModel(f64);

impl SequenceModel for ConstantModel {
    fn predict(&self, _window: ArrayView2<'_, f64>) -> Result<f64> {
        Ok(self.0)
    }
}

/// Architecture stub loading real scaler params from the artifact layout
struct StubArchitecture;

impl Architecture for StubArchitecture {
    fn name(&self) -> &str {
        "lstm"
    }

    fn load(&self, building: &Building, config: &ArtifactConfig) -> Result<ModelArtifacts> {
        let scaler = load_scaler_params(&config.scaler_path(building, self.name()))?;
        Ok(ModelArtifacts {
            model: Arc::new(ConstantModel(0.25)),
            scaler,
        })
    }
}

/// Source stub: smooth sinusoidal load ending just before `start`
struct StubHistory;

impl HistoricalDataSource for StubHistory {
    fn historical(
        &self,
        _building: &Building,
        start: DateTime<Utc>,
        lookback_hours: usize,
    ) -> Result<FeatureFrame> {
        let from = start - Duration::hours(lookback_hours as i64);
        let n = lookback_hours;
        let mut values = Vec::with_capacity(n * 2);
        for i in 0..n {
            let daily = (2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0).sin();
            values.push(150.0 + 25.0 * daily);
            values.push(40.0 + 10.0 * daily);
        }
        FeatureFrame::new(
            hourly(from, n),
            vec![POWER_COLUMN.to_string(), OCCUPANCY_COLUMN.to_string()],
            Array2::from_shape_vec((n, 2), values).unwrap(),
        )
    }
}

struct StubFuture;

impl FutureRegressorSource for StubFuture {
    fn future(
        &self,
        _building: &Building,
        start: DateTime<Utc>,
        horizon_hours: usize,
    ) -> Result<FeatureFrame> {
        FeatureFrame::new(
            hourly(start, horizon_hours),
            vec![OCCUPANCY_COLUMN.to_string()],
            Array2::from_elem((horizon_hours, 1), 45.0),
        )
    }
}

fn write_scaler(dir: &std::path::Path, building: &Building) {
    let model_dir = dir.join(building.model_subdir()).join("lstm");
    std::fs::create_dir_all(&model_dir).unwrap();
    let mut file = std::fs::File::create(model_dir.join("scale.json")).unwrap();
    // target + occupancy + five calendar columns
    let mean = vec![150.0, 40.0, 0.0, 0.0, 0.0, 0.0, 0.5];
    let std = vec![25.0, 10.0, 0.7, 0.7, 0.7, 0.7, 0.5];
    write!(
        file,
        "{}",
        serde_json::json!({ "mean": mean, "std": std })
    )
    .unwrap();
}

#[test]
fn test_predictor_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let building = Building::watt();
    write_scaler(dir.path(), &building);

    let config = ForecastConfig::new()
        .with_horizon(5)
        .with_lookback(30)
        .with_seasonal_lag(6);

    let predictor = Predictor::new(
        &StubArchitecture,
        building,
        &ArtifactConfig::new(dir.path()),
        config,
        Box::new(StubHistory),
        Box::new(StubFuture),
    )
    .unwrap();

    let start = base_time() + Duration::days(30);
    let forecast = predictor.forecast(start, None).unwrap();

    assert_eq!(forecast.len(), 5);
    assert_eq!(forecast.name(), POWER_COLUMN);
    assert_eq!(forecast.index()[0], start);
    assert!(forecast.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_predictor_future_range_override() {
    let dir = tempfile::tempdir().unwrap();
    let building = Building::cooper();
    write_scaler(dir.path(), &building);

    let config = ForecastConfig::new()
        .with_horizon(5)
        .with_lookback(30)
        .with_seasonal_lag(6);

    let predictor = Predictor::new(
        &StubArchitecture,
        building,
        &ArtifactConfig::new(dir.path()),
        config,
        Box::new(StubHistory),
        Box::new(StubFuture),
    )
    .unwrap();

    let start = base_time() + Duration::days(30);
    let forecast = predictor.forecast(start, Some(3)).unwrap();
    assert_eq!(forecast.len(), 3);
}

#[test]
fn test_predictor_missing_artifacts() {
    let dir = tempfile::tempdir().unwrap();

    let result = Predictor::new(
        &StubArchitecture,
        Building::asc(),
        &ArtifactConfig::new(dir.path()),
        ForecastConfig::new()
            .with_horizon(5)
            .with_lookback(30)
            .with_seasonal_lag(6),
        Box::new(StubHistory),
        Box::new(StubFuture),
    );
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}
