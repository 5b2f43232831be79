use crate::error::PipelineError;
use crate::forecast::types::HourlyRecord;
use crate::time::DayBoundary;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const MS_TO_KMH: f64 = 3.6;

/// All readings that fall on one calendar date, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBucket {
    pub temperatures: Vec<f64>,
    pub feels_like: Vec<f64>,
    pub humidity: Vec<f64>,
    pub pressure: Vec<f64>,
    /// km/h
    pub wind_speed: Vec<f64>,
    /// Condition of the first record seen for the date, not a majority vote.
    pub weather_main: String,
}

impl DayBucket {
    fn new(weather_main: String) -> Self {
        Self {
            weather_main,
            ..Default::default()
        }
    }

    fn push(&mut self, record: &HourlyRecord) {
        self.temperatures.push(record.main.temp);
        self.feels_like.push(record.main.feels_like);
        self.humidity.push(record.main.humidity);
        self.pressure.push(record.main.pressure);
        self.wind_speed.push(record.wind.speed * MS_TO_KMH);
    }

    pub fn len(&self) -> usize {
        self.temperatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperatures.is_empty()
    }
}

/// Day buckets keyed by date, ordered by the first appearance of each date in
/// the input. Never re-sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyBuckets {
    days: Vec<(NaiveDate, DayBucket)>,
    index: HashMap<NaiveDate, usize>,
}

impl DailyBuckets {
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DayBucket)> + '_ {
        self.days.iter().map(|(d, b)| (d, b))
    }

    fn bucket_mut(
        &mut self,
        date: NaiveDate,
        record: &HourlyRecord,
    ) -> Result<&mut DayBucket, PipelineError> {
        let idx = match self.index.get(&date).copied() {
            Some(i) => i,
            None => {
                let label = record
                    .weather
                    .first()
                    .map(|w| w.main.clone())
                    .ok_or_else(|| {
                        PipelineError::aggregation(format!(
                            "forecast record dt={} has no weather condition",
                            record.dt
                        ))
                    })?;
                self.days.push((date, DayBucket::new(label)));
                let i = self.days.len() - 1;
                self.index.insert(date, i);
                i
            }
        };
        Ok(&mut self.days[idx].1)
    }
}

/// Group hourly records into per-date buckets.
pub fn aggregate_daily(
    records: &[HourlyRecord],
    boundary: DayBoundary,
    city_offset_secs: Option<i32>,
) -> Result<DailyBuckets, PipelineError> {
    let mut out = DailyBuckets::default();
    for record in records {
        let date = boundary
            .date_of(record.dt, city_offset_secs)
            .map_err(|e| PipelineError::aggregation(format!("{e:#}")))?;
        out.bucket_mut(date, record)?.push(record);
    }
    Ok(out)
}
