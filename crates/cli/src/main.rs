use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heatwave_core::config::Settings;
use heatwave_core::domain::prediction::HeatwaveReport;
use heatwave_core::forecast::types::ForecastResponse;
use heatwave_core::forecast::OpenWeatherClient;
use heatwave_core::model::ModelArtifact;
use heatwave_core::pipeline::{self, PipelineContext};
use heatwave_core::time::DayBoundary;

#[derive(Debug, Parser)]
#[command(name = "heatwave_cli", about = "Score heatwave risk for the next days of a city")]
struct Args {
    /// City to look up. With --payload this is only the label in the report.
    #[arg(long)]
    city: Option<String>,

    /// Score a saved forecast JSON instead of calling the provider.
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Model artifact; defaults to MODEL_PATH.
    #[arg(long)]
    model: Option<PathBuf>,

    /// local, utc or city. Defaults to FORECAST_DAY_BOUNDARY.
    #[arg(long)]
    day_boundary: Option<DayBoundary>,

    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let report = match run(&settings, &args).await {
        Ok(report) => report,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "heatwave run failed");
            return Err(err);
        }
    };

    let out = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");
    Ok(())
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<HeatwaveReport> {
    let model_path = match &args.model {
        Some(path) => path.clone(),
        None => PathBuf::from(settings.require_model_path()?),
    };
    let classifier = ModelArtifact::load(&model_path)?;
    let day_boundary = args.day_boundary.unwrap_or(settings.day_boundary);

    if let Some(payload) = &args.payload {
        let text = std::fs::read_to_string(payload)
            .with_context(|| format!("failed to read payload {}", payload.display()))?;
        let forecast = serde_json::from_str::<ForecastResponse>(&text)
            .with_context(|| format!("payload {} is not a forecast response", payload.display()))?;

        let city = args
            .city
            .clone()
            .or_else(|| forecast.city.as_ref().and_then(|c| c.name.clone()))
            .unwrap_or_else(|| payload.display().to_string());

        tracing::info!(%city, records = forecast.list.len(), %day_boundary, "scoring saved forecast");
        let report = pipeline::score_forecast(
            &classifier,
            &city,
            &forecast,
            day_boundary,
            chrono::Local::now(),
        )?;
        return Ok(report);
    }

    let city = args
        .city
        .as_deref()
        .context("--city is required unless --payload is given")?;

    let ctx = PipelineContext {
        forecast: Arc::new(OpenWeatherClient::from_settings(settings)?),
        classifier: Arc::new(classifier),
        day_boundary,
    };
    Ok(pipeline::predict_city(&ctx, city).await?)
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
