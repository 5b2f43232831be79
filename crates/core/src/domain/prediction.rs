use crate::pipeline::risk::RiskLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatwaveReport {
    pub city: String,
    pub predictions: Vec<Prediction>,
    /// Server local time, `YYYY-MM-DD HH:MM:SS`.
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// `YYYY-MM-DD`
    pub date: String,
    pub day_name: String,
    pub max_temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub weather: String,
    pub heatwave_percentage: f64,
    pub risk_level: RiskLevel,
    pub color: String,
}
