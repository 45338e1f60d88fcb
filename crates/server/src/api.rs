//! HTTP API for predictions, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use predictor_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::PredictorMetrics,
    BoxOfficePredictor, PredictRequest, PredictionError,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// `None` when the artifact set failed to load
    pub predictor: Option<Arc<BoxOfficePredictor>>,
    /// Why the artifacts are unavailable, if they are
    pub load_error: Option<String>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
}

impl AppState {
    pub fn ready(
        predictor: BoxOfficePredictor,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
    ) -> Self {
        Self {
            predictor: Some(Arc::new(predictor)),
            load_error: None,
            health_registry,
            metrics,
        }
    }

    pub fn unavailable(
        error: &PredictionError,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
    ) -> Self {
        Self {
            predictor: None,
            load_error: Some(error.to_string()),
            health_registry,
            metrics,
        }
    }

    fn predictor(&self) -> Result<&BoxOfficePredictor, ApiError> {
        self.predictor.as_deref().ok_or_else(|| ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            kind: "resource_unavailable",
            message: self
                .load_error
                .clone()
                .unwrap_or_else(|| "prediction artifacts are not loaded".to_string()),
        })
    }
}

/// JSON error body: `{"error": kind, "message": ...}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        let status = match &err {
            PredictionError::ResourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PredictionError::MalformedInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PredictionError::ShapeMismatch { .. } | PredictionError::InferenceFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            kind: "malformed_input",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(kind = self.kind, message = %self.message, "Request failed");
        }
        let body = ErrorBody {
            error: self.kind,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Predict box office revenue for one movie
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    // The pipeline counts its own failures; refusals happen before it runs
    let predictor = state
        .predictor()
        .inspect_err(|err| state.metrics.inc_prediction_errors(err.kind))?;
    let prediction = predictor.predict(&request.attributes)?;
    Ok(Json(prediction))
}

/// Feature columns and input scheme in force
async fn features(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.predictor()?.listing()))
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/predict", post(predict))
        .route("/v1/features", get(features))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, stopping when `shutdown` resolves
pub async fn serve<F>(port: u16, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
