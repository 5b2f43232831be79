pub mod aggregate;
pub mod features;
pub mod risk;

use crate::domain::prediction::{HeatwaveReport, Prediction};
use crate::error::PipelineError;
use crate::forecast::types::ForecastResponse;
use crate::forecast::ForecastClient;
use crate::model::HeatwaveClassifier;
use crate::time::DayBoundary;
use aggregate::{aggregate_daily, DayBucket};
use chrono::{DateTime, Local, NaiveDate};
use features::build_features;
use risk::RiskLevel;
use std::sync::Arc;

/// Number of days a report carries.
pub const MAX_PREDICTION_DAYS: usize = 5;

/// Everything one prediction run needs, built once at startup.
#[derive(Clone)]
pub struct PipelineContext {
    pub forecast: Arc<dyn ForecastClient>,
    pub classifier: Arc<dyn HeatwaveClassifier>,
    pub day_boundary: DayBoundary,
}

/// Fetch, aggregate and score the forecast for `city`.
pub async fn predict_city(
    ctx: &PipelineContext,
    city: &str,
) -> Result<HeatwaveReport, PipelineError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(PipelineError::MissingInput);
    }

    let forecast = ctx.forecast.fetch_forecast(city).await?;
    tracing::info!(
        %city,
        provider = ctx.forecast.provider_name(),
        records = forecast.list.len(),
        "forecast received"
    );

    score_forecast(
        ctx.classifier.as_ref(),
        city,
        &forecast,
        ctx.day_boundary,
        Local::now(),
    )
}

/// Turn an already fetched forecast into a report. Deterministic for a fixed
/// classifier and `now`.
pub fn score_forecast(
    classifier: &dyn HeatwaveClassifier,
    city: &str,
    forecast: &ForecastResponse,
    day_boundary: DayBoundary,
    now: DateTime<Local>,
) -> Result<HeatwaveReport, PipelineError> {
    let days = aggregate_daily(&forecast.list, day_boundary, forecast.city_offset_secs())?;

    let mut predictions = Vec::with_capacity(days.len().min(MAX_PREDICTION_DAYS));
    for (date, bucket) in days.iter().take(MAX_PREDICTION_DAYS) {
        predictions.push(predict_day(classifier, *date, bucket)?);
    }

    Ok(HeatwaveReport {
        city: city.to_string(),
        predictions,
        updated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

fn predict_day(
    classifier: &dyn HeatwaveClassifier,
    date: NaiveDate,
    bucket: &DayBucket,
) -> Result<Prediction, PipelineError> {
    let features = build_features(date, bucket)?;

    let probability = classifier.heatwave_probability(&features).map_err(|e| {
        PipelineError::classification(format!(
            "model {} failed for {date}: {e:#}",
            classifier.name()
        ))
    })?;
    let pct = probability * 100.0;
    // The tier is decided on the unrounded percentage.
    let risk = RiskLevel::from_percentage(pct);

    tracing::debug!(%date, pct, risk = risk.as_str(), "day scored");

    Ok(Prediction {
        date: date.format("%Y-%m-%d").to_string(),
        day_name: date.format("%A").to_string(),
        max_temperature: round1(features.temp_c),
        feels_like: round1(features.feelslike_c),
        humidity: features.humidity.round_ties_even() as i64,
        weather: bucket.weather_main.clone(),
        heatwave_percentage: round1(pct),
        risk_level: risk,
        color: risk.color().to_string(),
    })
}

/// One decimal place, rounded on the exact decimal expansion of `v` with ties
/// to even. Scaling by ten first would round the already inexact product.
fn round1(v: f64) -> f64 {
    format!("{v:.1}").parse().unwrap_or(v)
}
