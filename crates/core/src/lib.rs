pub mod domain;
pub mod error;
pub mod forecast;
pub mod model;
pub mod pipeline;
pub mod time;

pub mod config {
    use anyhow::Context;

    use crate::time::DayBoundary;

    pub const DEFAULT_PORT: u16 = 5000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub openweather_api_key: Option<String>,
        pub openweather_base_url: Option<String>,
        pub forecast_timeout_secs: Option<u64>,
        pub model_path: Option<String>,
        pub day_boundary: DayBoundary,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let port = match std::env::var("PORT") {
                Ok(v) => v
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {v:?})"))?,
                Err(_) => DEFAULT_PORT,
            };

            let day_boundary = match std::env::var("FORECAST_DAY_BOUNDARY") {
                Ok(v) => v.parse::<DayBoundary>()?,
                Err(_) => DayBoundary::default(),
            };

            Ok(Self {
                port,
                openweather_api_key: non_empty_var("OPENWEATHER_API_KEY"),
                openweather_base_url: non_empty_var("OPENWEATHER_BASE_URL"),
                forecast_timeout_secs: std::env::var("FORECAST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                model_path: non_empty_var("MODEL_PATH"),
                day_boundary,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_openweather_api_key(&self) -> anyhow::Result<&str> {
            self.openweather_api_key
                .as_deref()
                .context("OPENWEATHER_API_KEY is required")
        }

        /// There is no default: scoring needs an exported, trained model.
        pub fn require_model_path(&self) -> anyhow::Result<&str> {
            self.model_path
                .as_deref()
                .context("MODEL_PATH is required (path to an exported model artifact)")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
