use crate::error::PipelineError;
use crate::pipeline::aggregate::DayBucket;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const FEATURE_COUNT: usize = 11;

/// Column order the classifier was trained on. Any permutation silently
/// produces wrong scores, so inference only ever sees `FeatureVector::to_array`.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "temp_c",
    "feelslike_c",
    "humidity",
    "dewpoint_c",
    "pressure_mb",
    "wind_kph",
    "hour",
    "month",
    "temp_rolling_3h",
    "temp_rolling_24h",
    "daily_temp_range",
];

/// Fixed hour of day fed to the model for every daily row (2 PM).
pub const FEATURE_HOUR: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: f64,
    pub dewpoint_c: f64,
    pub pressure_mb: f64,
    pub wind_kph: f64,
    pub hour: f64,
    pub month: f64,
    pub temp_rolling_3h: f64,
    pub temp_rolling_24h: f64,
    pub daily_temp_range: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_ORDER`.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.temp_c,
            self.feelslike_c,
            self.humidity,
            self.dewpoint_c,
            self.pressure_mb,
            self.wind_kph,
            self.hour,
            self.month,
            self.temp_rolling_3h,
            self.temp_rolling_24h,
            self.daily_temp_range,
        ]
    }
}

/// Reductions of one day's readings.
#[derive(Debug, Clone, PartialEq)]
struct DailySummary {
    max_temp: f64,
    min_temp: f64,
    avg_feels: f64,
    avg_humidity: f64,
    avg_pressure: f64,
    avg_wind: f64,
}

impl DailySummary {
    fn from_bucket(date: NaiveDate, bucket: &DayBucket) -> Result<Self, PipelineError> {
        if bucket.is_empty() {
            return Err(PipelineError::aggregation(format!("no readings for {date}")));
        }

        Ok(Self {
            max_temp: max(&bucket.temperatures),
            min_temp: min(&bucket.temperatures),
            avg_feels: mean(&bucket.feels_like),
            avg_humidity: mean(&bucket.humidity),
            avg_pressure: mean(&bucket.pressure),
            avg_wind: mean(&bucket.wind_speed),
        })
    }
}

/// Model input for one day. `temp_c`, `feelslike_c` and `humidity` double as
/// the day's display values.
pub fn build_features(
    date: NaiveDate,
    bucket: &DayBucket,
) -> Result<FeatureVector, PipelineError> {
    let s = DailySummary::from_bucket(date, bucket)?;
    Ok(features_from_summary(date, &s))
}

fn features_from_summary(date: NaiveDate, s: &DailySummary) -> FeatureVector {
    FeatureVector {
        temp_c: s.max_temp,
        feelslike_c: s.avg_feels,
        humidity: s.avg_humidity,
        // Approximation the model was trained on, not a physical dew point.
        dewpoint_c: s.max_temp - ((100.0 - s.avg_humidity) / 5.0),
        pressure_mb: s.avg_pressure,
        wind_kph: s.avg_wind,
        hour: FEATURE_HOUR,
        month: f64::from(date.month()),
        // Placeholders matching the training pipeline.
        temp_rolling_3h: s.max_temp,
        temp_rolling_24h: s.max_temp,
        daily_temp_range: s.max_temp - s.min_temp,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
