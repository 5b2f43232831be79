use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heatwave_core::config::Settings;
use heatwave_core::domain::prediction::HeatwaveReport;
use heatwave_core::error::PipelineError;
use heatwave_core::forecast::OpenWeatherClient;
use heatwave_core::model::ModelArtifact;
use heatwave_core::pipeline::{self, PipelineContext};

const UPSTREAM_ERROR_MESSAGE: &str = "City not found or API error";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = match build_state(&settings) {
        Ok(state) => state,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            return Err(e);
        }
    };

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, day_boundary = %settings.day_boundary, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    ctx: PipelineContext,
}

fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let classifier = ModelArtifact::load(settings.require_model_path()?)?;
    let forecast = OpenWeatherClient::from_settings(settings)?;

    Ok(AppState {
        ctx: PipelineContext {
            forecast: Arc::new(forecast),
            classifier: Arc::new(classifier),
            day_boundary: settings.day_boundary,
        },
    })
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/predict_heatwave", post(predict_heatwave))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({"status": "API running!"}))
}

async fn predict_heatwave(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HeatwaveReport>, ApiError> {
    let city = city_from_body(&body)?;
    let report = pipeline::predict_city(&state.ctx, &city).await?;
    Ok(Json(report))
}

/// `{"city": "<non-blank string>"}`; anything else is a missing city.
fn city_from_body(body: &[u8]) -> Result<String, PipelineError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| PipelineError::MissingInput)?;
    value
        .get("city")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or(PipelineError::MissingInput)
}

struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PipelineError::MissingInput => (StatusCode::BAD_REQUEST, self.0.to_string()),
            PipelineError::UpstreamUnavailable { status, detail } => {
                tracing::warn!(
                    upstream_status = ?status,
                    %detail,
                    "forecast lookup failed"
                );
                (StatusCode::NOT_FOUND, UPSTREAM_ERROR_MESSAGE.to_string())
            }
            PipelineError::AggregationFailure(_) | PipelineError::ClassificationFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string())
            }
        };

        if self.0.is_internal() {
            tracing::error!(error = %message, "prediction failed");
            sentry_anyhow::capture_anyhow(&anyhow::Error::new(self.0));
        }

        (status, Json(json!({"error": message}))).into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
