use crate::config::Settings;
use crate::error::PipelineError;
use crate::forecast::types::ForecastResponse;
use crate::forecast::ForecastClient;
use anyhow::Context;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const FORECAST_PATH: &str = "/forecast";
const UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openweather_api_key()?.to_string();
        let base_url = settings
            .openweather_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings
            .forecast_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, api_key, Duration::from_secs(timeout_secs))
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build forecast http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), FORECAST_PATH)
    }
}

#[async_trait::async_trait]
impl ForecastClient for OpenWeatherClient {
    fn provider_name(&self) -> &'static str {
        "openweathermap"
    }

    async fn fetch_forecast(&self, city: &str) -> Result<ForecastResponse, PipelineError> {
        let res = self
            .http
            .get(self.url())
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", UNITS),
            ])
            .send()
            .await
            .map_err(|err| {
                // reqwest errors carry the URL, which carries the key.
                PipelineError::upstream_transport(err.without_url().to_string())
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|err| {
            PipelineError::upstream_transport(format!(
                "failed to read forecast response: {}",
                err.without_url()
            ))
        })?;

        // Anything but 200 is a failed lookup, including other 2xx codes.
        if status != reqwest::StatusCode::OK {
            tracing::warn!(%city, http_status = %status, "forecast lookup rejected by provider");
            return Err(PipelineError::upstream_status(status.as_u16(), text));
        }

        let parsed = serde_json::from_str::<ForecastResponse>(&text).map_err(|err| {
            PipelineError::aggregation(format!("unexpected forecast payload: {err}"))
        })?;

        tracing::debug!(%city, records = parsed.list.len(), "forecast fetched");
        Ok(parsed)
    }
}
