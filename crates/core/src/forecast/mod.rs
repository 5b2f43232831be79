pub mod openweather;
pub mod types;

use crate::error::PipelineError;
use types::ForecastResponse;

pub use openweather::OpenWeatherClient;

#[async_trait::async_trait]
pub trait ForecastClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// One lookup by free-text city name. No retries.
    async fn fetch_forecast(&self, city: &str) -> Result<ForecastResponse, PipelineError>;
}
