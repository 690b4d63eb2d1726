//! HTTP surface over the aggregator.

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{info, warn};
use weather_core::{Aggregator, WeatherReport};

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
}

/// GET / - Greeting, independent of any provider
async fn hello() -> &'static str {
    "hello, this is weather api"
}

/// GET /weather/{city} - Mean temperature across all providers, in Kelvin
async fn weather(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    let begin = Instant::now();

    match state.aggregator.temperature(&city).await {
        Ok(temperature) => Json(WeatherReport {
            city,
            temperature,
            took: format!("{:?}", begin.elapsed()),
        })
        .into_response(),
        Err(err) => {
            warn!(error = %err, "weather request failed: {city}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// Create the HTTP router
pub fn create_router(aggregator: Arc<Aggregator>) -> Router {
    let state = AppState { aggregator };

    Router::new()
        .route("/", get(hello))
        .route("/weather/{*city}", get(weather))
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C.
pub async fn run_http_server(aggregator: Arc<Aggregator>, addr: &str) -> anyhow::Result<()> {
    let providers = aggregator.providers().len();
    let app = create_router(aggregator);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(providers, "HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
    }
}
