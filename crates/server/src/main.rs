//! Box office prediction server
//!
//! Loads the trained artifacts once at startup and serves predictions,
//! health checks and Prometheus metrics over HTTP.

use anyhow::Result;
use predictor_lib::{
    artifacts::{DirectoryStore, ResourceLoader},
    health::HealthRegistry,
    observability::{PredictorMetrics, StructuredLogger},
    BoxOfficePredictor, PredictionError,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ServerConfig::load()?;
    let logger = StructuredLogger::new("boxoffice-server");
    logger.log_startup(SERVER_VERSION);
    info!(
        artifact_dir = %config.artifact_dir.display(),
        model = %config.model_name,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = PredictorMetrics::new();

    let loader = ResourceLoader::with_config(
        DirectoryStore::new(&config.artifact_dir),
        config.loader_config(),
    );

    // A failed load still serves health and metrics; predictions get 503
    let app_state = match BoxOfficePredictor::load(&loader) {
        Ok(predictor) => {
            let predictor = predictor
                .with_slow_inference_threshold(config.slow_inference_threshold())
                .with_logger(logger.clone());
            logger.log_artifacts_loaded(
                predictor.fingerprint(),
                &predictor.scheme().to_string(),
                predictor.feature_columns().len(),
            );
            health_registry.mark_artifacts_loaded().await;
            api::AppState::ready(predictor, health_registry.clone(), metrics.clone())
        }
        Err(err) => {
            let artifact = match &err {
                PredictionError::ResourceUnavailable { artifact, .. } => artifact.as_str(),
                _ => "unknown",
            };
            logger.log_artifacts_unavailable(artifact, &err.to_string());
            health_registry
                .mark_artifacts_unavailable(err.to_string())
                .await;
            api::AppState::unavailable(&err, health_registry.clone(), metrics.clone())
        }
    };

    let shutdown_logger = logger.clone();
    let shutdown = async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_logger.log_shutdown("SIGINT received");
        }
    };

    api::serve(config.api_port, Arc::new(app_state), shutdown).await?;
    info!("Shutting down");

    Ok(())
}
