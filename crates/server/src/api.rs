//! HTTP API: price queries plus health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use estimator_lib::{
    health::{components, HealthRegistry},
    observability::{EstimatorMetrics, StructuredLogger},
    Estimator, EstimatorError, ModelInfo, PredictionRequest, PredictionResult,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<Estimator>,
    pub health_registry: HealthRegistry,
    pub metrics: EstimatorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        estimator: Arc<Estimator>,
        health_registry: HealthRegistry,
        metrics: EstimatorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            estimator,
            health_registry,
            metrics,
            logger,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Library error rendered as a JSON body
pub struct ApiError(EstimatorError);

impl From<EstimatorError> for ApiError {
    fn from(err: EstimatorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EstimatorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EstimatorError::Inference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    /// Case-insensitive substring filter
    pub filter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationList {
    pub locations: Vec<String>,
    pub total: usize,
}

/// Decode and validate the body; any failure is `InvalidRequest`
fn parse_request(
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> estimator_lib::Result<PredictionRequest> {
    let Json(request) =
        payload.map_err(|rejection| EstimatorError::InvalidRequest(rejection.body_text()))?;
    request.validate()?;
    Ok(request)
}

/// Estimate a price. Failures are reported to this caller only.
async fn estimate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let request = parse_request(payload).map_err(|err| {
        state.metrics.inc_invalid_requests();
        ApiError::from(err)
    })?;

    let start = Instant::now();
    match state.estimator.handle_query(&request) {
        Ok(result) => {
            state
                .metrics
                .observe_estimate_latency(start.elapsed().as_secs_f64());
            state.metrics.inc_estimates_generated();
            if !result.location_known {
                state.metrics.inc_unknown_locations();
                state.logger.log_unknown_location(&request.location);
            }
            state.health_registry.record_inference(Ok(())).await;
            state.logger.log_estimate(
                &request.location,
                request.sqft,
                request.bhk,
                request.bath,
                result.price_lakhs,
                result.location_known,
            );
            Ok(Json(result))
        }
        Err(err) => {
            if matches!(err, EstimatorError::Inference(_)) {
                let reason = err.to_string();
                state.metrics.inc_inference_errors();
                state.health_registry.record_inference(Err(&reason)).await;
                state.logger.log_inference_failure(&request.location, &reason);
            } else {
                error!(error = %err, "Unexpected estimate failure");
            }
            Err(err.into())
        }
    }
}

/// Known locations, sorted for a select list
async fn locations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationQuery>,
) -> Json<LocationList> {
    let mut locations = state.estimator.schema().sorted_locations();
    if let Some(filter) = query.filter.as_deref().map(str::to_lowercase) {
        locations.retain(|name| name.to_lowercase().contains(&filter));
    }
    let total = locations.len();
    Json(LocationList { locations, total })
}

async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(state.estimator.model_info())
}

/// Health check response - returns 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
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

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/estimate", post(estimate))
        .route("/api/v1/locations", get(locations))
        .route("/api/v1/model", get(model_info))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Register the health components this service reports on.
/// Schema and model stay unhealthy until `mark_artifacts_loaded`.
pub async fn register_components(registry: &HealthRegistry) {
    registry
        .register_pending(components::SCHEMA, "not loaded")
        .await;
    registry
        .register_pending(components::MODEL, "not loaded")
        .await;
    registry.register(components::INFERENCE).await;
}

/// Both artifacts are in memory; the schema and model components are healthy
pub async fn mark_artifacts_loaded(registry: &HealthRegistry) {
    registry.set_healthy(components::SCHEMA).await;
    registry.set_healthy(components::MODEL).await;
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
