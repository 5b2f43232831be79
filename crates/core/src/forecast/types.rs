use serde::{Deserialize, Serialize};

/// Body of the provider's 5 day / 3 hour forecast endpoint. Only the fields the
/// pipeline reads are modelled; everything else is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<HourlyRecord>,
    #[serde(default)]
    pub city: Option<CityInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyRecord {
    /// Unix seconds, UTC.
    pub dt: i64,
    pub main: MainReadings,
    pub weather: Vec<WeatherCondition>,
    pub wind: Wind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wind {
    /// Metres per second with metric units.
    pub speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityInfo {
    #[serde(default)]
    pub name: Option<String>,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: Option<i32>,
}

impl ForecastResponse {
    pub fn city_offset_secs(&self) -> Option<i32> {
        self.city.as_ref().and_then(|c| c.timezone)
    }
}
