//! Calendar feature engineering
//!
//! Deterministic columns derived purely from the timestamp index: cyclical
//! encodings of the annual and daily cycles plus a weekend indicator.

use crate::error::Result;
use crate::frame::FeatureFrame;
use chrono::{Datelike, Timelike};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Engineered column names, in the order they are appended
pub const CALENDAR_COLUMNS: [&str; 5] =
    ["sin(day)", "cos(day)", "sin(hour)", "cos(hour)", "weekend"];

/// Which days carry the weekend flag.
///
/// The bundled sequence models were trained with the flag set on weekDAYS,
/// the inverse of the usual convention. The polarity is part of the trained
/// artifact's feature contract and must travel with it; flipping it without
/// retraining silently corrupts every forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekendPolarity {
    /// Flag = 1 on Monday through Friday (the bundled-model convention)
    WeekdaysFlagged,
    /// Flag = 1 on Saturday and Sunday
    WeekendsFlagged,
}

impl WeekendPolarity {
    /// Flag value for a day-of-week index (0 = Monday .. 6 = Sunday)
    fn flag(self, days_from_monday: u32) -> f64 {
        let is_weekday = days_from_monday < 5;
        let flagged = match self {
            WeekendPolarity::WeekdaysFlagged => is_weekday,
            WeekendPolarity::WeekendsFlagged => !is_weekday,
        };
        if flagged {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for WeekendPolarity {
    fn default() -> Self {
        WeekendPolarity::WeekdaysFlagged
    }
}

/// Appends the cyclical time-of-year/day and weekend columns
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CalendarFeatures {
    polarity: WeekendPolarity,
}

impl CalendarFeatures {
    pub fn new(polarity: WeekendPolarity) -> Self {
        Self { polarity }
    }

    pub fn polarity(&self) -> WeekendPolarity {
        self.polarity
    }

    /// Append the five calendar columns to the frame, in the fixed order
    /// `sin(day)`, `cos(day)`, `sin(hour)`, `cos(hour)`, `weekend`.
    pub fn append(&self, frame: &mut FeatureFrame) -> Result<()> {
        let tau = 2.0 * std::f64::consts::PI;
        let n = frame.n_rows();

        let mut sin_day = Array1::zeros(n);
        let mut cos_day = Array1::zeros(n);
        let mut sin_hour = Array1::zeros(n);
        let mut cos_hour = Array1::zeros(n);
        let mut weekend = Array1::zeros(n);

        for (i, ts) in frame.index().iter().enumerate() {
            let day_angle = tau * ts.ordinal() as f64 / 365.0;
            let hour_angle = tau * ts.hour() as f64 / 24.0;

            sin_day[i] = day_angle.sin();
            cos_day[i] = day_angle.cos();
            sin_hour[i] = hour_angle.sin();
            cos_hour[i] = hour_angle.cos();
            weekend[i] = self.polarity.flag(ts.weekday().num_days_from_monday());
        }

        frame.append_column(CALENDAR_COLUMNS[0], sin_day)?;
        frame.append_column(CALENDAR_COLUMNS[1], cos_day)?;
        frame.append_column(CALENDAR_COLUMNS[2], sin_hour)?;
        frame.append_column(CALENDAR_COLUMNS[3], cos_hour)?;
        frame.append_column(CALENDAR_COLUMNS[4], weekend)?;
        Ok(())
    }
}
