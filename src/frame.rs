//! Time-indexed series and feature-frame types
//!
//! All pipeline stages exchange data through these two types: [`TimeSeries`]
//! for a single named hourly column and [`FeatureFrame`] for a
//! timestamp-indexed matrix with a fixed, ordered column set. Missing
//! observations are explicit `NaN` cells, never silently omitted rows.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array2, ArrayView1};
use std::collections::BTreeMap;

/// Seconds per hour, the canonical grid step.
pub const HOUR_SECS: i64 = 3600;

/// Check if a value is the missing-data marker (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// Truncate a timestamp down to the start of its hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(HOUR_SECS);
    DateTime::<Utc>::from_timestamp(floored, 0).unwrap_or(ts)
}

/// A single named time series with an explicit missing-value marker
#[derive(Debug, Clone)]
pub struct TimeSeries {
    name: String,
    index: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from parallel index/value vectors.
    /// The index must be strictly increasing.
    pub fn new(
        name: impl Into<String>,
        index: Vec<DateTime<Utc>>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if index.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "index length {} does not match value length {}",
                index.len(),
                values.len()
            )));
        }
        if index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            index,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Collapse raw observations onto hourly means.
    ///
    /// Real-world observation times rarely line up; every observation is
    /// assigned to the hour containing it and each hour keeps the mean of its
    /// non-missing observations. Hours with no observations at all do not
    /// appear in the output (alignment inserts them later).
    pub fn resample_hourly_mean(&self) -> Result<TimeSeries> {
        if self.is_empty() {
            return Err(ForecastError::DataError(format!(
                "cannot resample empty series '{}'",
                self.name
            )));
        }

        let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
        for (ts, &v) in self.index.iter().zip(self.values.iter()) {
            if is_missing(v) {
                continue;
            }
            let hour = floor_to_hour(*ts).timestamp();
            let entry = buckets.entry(hour).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }

        let mut index = Vec::with_capacity(buckets.len());
        let mut values = Vec::with_capacity(buckets.len());
        for (hour, (sum, count)) in buckets {
            if let Some(ts) = DateTime::<Utc>::from_timestamp(hour, 0) {
                index.push(ts);
                values.push(sum / count as f64);
            }
        }

        TimeSeries::new(self.name.clone(), index, values)
    }

    /// Reindex onto the contiguous hourly grid spanning the first to last
    /// timestamp, inserting NaN for any hour not already present.
    pub fn align_hourly(&self) -> Result<TimeSeries> {
        if self.is_empty() {
            return Err(ForecastError::DataError(format!(
                "cannot align empty series '{}'",
                self.name
            )));
        }

        let grid = hourly_grid(self.index[0], self.index[self.index.len() - 1]);
        let lookup: BTreeMap<i64, f64> = self
            .index
            .iter()
            .zip(self.values.iter())
            .map(|(ts, &v)| (ts.timestamp(), v))
            .collect();

        let values: Vec<f64> = grid
            .iter()
            .map(|ts| lookup.get(&ts.timestamp()).copied().unwrap_or(f64::NAN))
            .collect();

        TimeSeries::new(self.name.clone(), grid, values)
    }
}

/// Build the hourly grid from `start` (floored to its hour) through `end`.
pub fn hourly_grid(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut grid = Vec::new();
    let mut ts = floor_to_hour(start);
    while ts <= end {
        grid.push(ts);
        ts = ts + Duration::hours(1);
    }
    grid
}

/// A timestamp-indexed matrix with a fixed, ordered column set.
///
/// By convention the forecast target, when present, is column 0; regressor
/// and engineered columns follow in the order agreed with the trained model.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureFrame {
    /// Create a frame from an index, column names, and a values matrix.
    pub fn new(
        index: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        if values.nrows() != index.len() {
            return Err(ForecastError::DataError(format!(
                "matrix has {} rows but index has {} timestamps",
                values.nrows(),
                index.len()
            )));
        }
        if values.ncols() != columns.len() {
            return Err(ForecastError::DataError(format!(
                "matrix has {} columns but {} names were given",
                values.ncols(),
                columns.len()
            )));
        }
        if index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    /// Assemble a frame from individual series, one column per series.
    ///
    /// Each series is placed on the union hourly grid spanning the earliest
    /// first timestamp to the latest last timestamp; hours a series does not
    /// cover are NaN. Column order follows the argument order.
    pub fn from_series(series: &[TimeSeries]) -> Result<FeatureFrame> {
        if series.is_empty() || series.iter().any(|s| s.is_empty()) {
            return Err(ForecastError::DataError(
                "cannot build a frame from empty series".to_string(),
            ));
        }

        let start = series
            .iter()
            .map(|s| s.index()[0])
            .min()
            .unwrap_or_else(Utc::now);
        let end = series
            .iter()
            .map(|s| s.index()[s.len() - 1])
            .max()
            .unwrap_or_else(Utc::now);
        let grid = hourly_grid(start, end);

        let mut values = Array2::from_elem((grid.len(), series.len()), f64::NAN);
        for (col, s) in series.iter().enumerate() {
            let lookup: BTreeMap<i64, f64> = s
                .index()
                .iter()
                .zip(s.values().iter())
                .map(|(ts, &v)| (ts.timestamp(), v))
                .collect();
            for (row, ts) in grid.iter().enumerate() {
                if let Some(&v) = lookup.get(&ts.timestamp()) {
                    values[[row, col]] = v;
                }
            }
        }

        let columns = series.iter().map(|s| s.name().to_string()).collect();
        FeatureFrame::new(grid, columns, values)
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(idx)
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(idx)
    }

    /// Replace the values of one column.
    pub fn set_column(&mut self, idx: usize, column: &Array1<f64>) -> Result<()> {
        if column.len() != self.n_rows() {
            return Err(ForecastError::DataError(format!(
                "replacement column has {} values, frame has {} rows",
                column.len(),
                self.n_rows()
            )));
        }
        self.values.column_mut(idx).assign(column);
        Ok(())
    }

    /// Append a column on the right.
    pub fn append_column(&mut self, name: impl Into<String>, column: Array1<f64>) -> Result<()> {
        if column.len() != self.n_rows() {
            return Err(ForecastError::DataError(format!(
                "appended column has {} values, frame has {} rows",
                column.len(),
                self.n_rows()
            )));
        }
        let mut values = Array2::from_elem((self.n_rows(), self.n_cols() + 1), f64::NAN);
        values
            .slice_mut(ndarray::s![.., ..self.n_cols()])
            .assign(&self.values);
        values.column_mut(self.n_cols()).assign(&column);
        self.values = values;
        self.columns.push(name.into());
        Ok(())
    }

    /// Frame restricted to rows `from..`.
    pub fn tail(&self, from: usize) -> Result<FeatureFrame> {
        if from > self.n_rows() {
            return Err(ForecastError::DataError(format!(
                "cannot drop {} rows from a {}-row frame",
                from,
                self.n_rows()
            )));
        }
        FeatureFrame::new(
            self.index[from..].to_vec(),
            self.columns.clone(),
            self.values.slice(ndarray::s![from.., ..]).to_owned(),
        )
    }

    /// Frame restricted to the first `n` rows.
    pub fn head(&self, n: usize) -> Result<FeatureFrame> {
        if n > self.n_rows() {
            return Err(ForecastError::DataError(format!(
                "cannot take {} rows from a {}-row frame",
                n,
                self.n_rows()
            )));
        }
        FeatureFrame::new(
            self.index[..n].to_vec(),
            self.columns.clone(),
            self.values.slice(ndarray::s![..n, ..]).to_owned(),
        )
    }

    /// Reindex every column onto the contiguous hourly grid spanning the
    /// frame's first to last timestamp, inserting NaN rows for absent hours.
    pub fn align_hourly(&self) -> Result<FeatureFrame> {
        if self.is_empty() {
            return Err(ForecastError::DataError(
                "cannot align an empty frame".to_string(),
            ));
        }

        let grid = hourly_grid(self.index[0], self.index[self.index.len() - 1]);
        let positions: BTreeMap<i64, usize> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, ts)| (ts.timestamp(), i))
            .collect();

        let mut values = Array2::from_elem((grid.len(), self.n_cols()), f64::NAN);
        for (row, ts) in grid.iter().enumerate() {
            if let Some(&src) = positions.get(&ts.timestamp()) {
                values.row_mut(row).assign(&self.values.row(src));
            }
        }

        FeatureFrame::new(grid, self.columns.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 11, 11, h, 0, 0).unwrap()
    }

    #[test]
    fn test_align_inserts_missing_hours() {
        let series = TimeSeries::new(
            "Power [kW]",
            vec![hour(0), hour(1), hour(3)],
            vec![1.0, 2.0, 4.0],
        )
        .unwrap();

        let aligned = series.align_hourly().unwrap();
        assert_eq!(aligned.len(), 4);
        assert!((aligned.values()[1] - 2.0).abs() < 1e-12);
        assert!(aligned.values()[2].is_nan());
        assert!((aligned.values()[3] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_align_idempotent() {
        let series = TimeSeries::new(
            "Power [kW]",
            vec![hour(0), hour(2), hour(5)],
            vec![1.0, 3.0, 6.0],
        )
        .unwrap();

        let once = series.align_hourly().unwrap();
        let twice = once.align_hourly().unwrap();

        assert_eq!(once.index(), twice.index());
        for (a, b) in once.values().iter().zip(twice.values().iter()) {
            assert!(a.is_nan() == b.is_nan());
            if !a.is_nan() {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_align_empty_fails() {
        let series = TimeSeries::new("Power [kW]", vec![], vec![]).unwrap();
        assert!(matches!(
            series.align_hourly(),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_resample_hourly_mean() {
        let base = hour(0);
        let series = TimeSeries::new(
            "Occupancy",
            vec![
                base + Duration::minutes(5),
                base + Duration::minutes(40),
                base + Duration::minutes(75),
            ],
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();

        let resampled = series.resample_hourly_mean().unwrap();
        assert_eq!(resampled.len(), 2);
        assert!((resampled.values()[0] - 15.0).abs() < 1e-12);
        assert!((resampled.values()[1] - 30.0).abs() < 1e-12);
        assert_eq!(resampled.index()[0], hour(0));
        assert_eq!(resampled.index()[1], hour(1));
    }

    #[test]
    fn test_from_series_union_grid() {
        let power = TimeSeries::new("Power [kW]", vec![hour(0), hour(1)], vec![1.0, 2.0]).unwrap();
        let temp =
            TimeSeries::new("Temperature [C]", vec![hour(1), hour(2)], vec![20.0, 21.0]).unwrap();

        let frame = FeatureFrame::from_series(&[power, temp]).unwrap();
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.n_cols(), 2);
        assert!(frame.values()[[0, 1]].is_nan());
        assert!(frame.values()[[2, 0]].is_nan());
        assert!((frame.values()[[1, 0]] - 2.0).abs() < 1e-12);
        assert!((frame.values()[[1, 1]] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_monotonic_index_rejected() {
        let result = TimeSeries::new("x", vec![hour(1), hour(1)], vec![1.0, 2.0]);
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[test]
    fn test_append_and_set_column() {
        let mut frame = FeatureFrame::new(
            vec![hour(0), hour(1)],
            vec!["Power [kW]".to_string()],
            Array2::from_shape_vec((2, 1), vec![1.0, 2.0]).unwrap(),
        )
        .unwrap();

        frame
            .append_column("weekend", Array1::from_vec(vec![1.0, 1.0]))
            .unwrap();
        assert_eq!(frame.n_cols(), 2);
        assert_eq!(frame.columns()[1], "weekend");

        frame
            .set_column(0, &Array1::from_vec(vec![5.0, 6.0]))
            .unwrap();
        assert!((frame.values()[[1, 0]] - 6.0).abs() < 1e-12);
    }
}
