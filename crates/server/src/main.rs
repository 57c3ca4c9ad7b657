//! Price Estimator - home price estimation service
//!
//! Loads the feature schema and frozen model once at startup, then serves
//! price queries over HTTP alongside health and metrics endpoints.

use anyhow::{Context, Result};
use estimator_lib::{
    health::HealthRegistry,
    observability::{EstimatorMetrics, StructuredLogger},
    ArtifactStore,
};
use price_estimator::{api, config};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ESTIMATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::EstimatorConfig::load()?;
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(ESTIMATOR_VERSION);

    let health_registry = HealthRegistry::new();
    api::register_components(&health_registry).await;

    let metrics = EstimatorMetrics::new();

    // Fail fast: nothing is served until both artifacts are loaded
    let store = ArtifactStore::new(config.artifacts(), metrics.clone());
    let estimator = match store.get_or_load().await {
        Ok(estimator) => estimator,
        Err(err) => {
            error!(error = %err, code = err.code(), "Failed to load artifacts");
            return Err(err).context("Startup aborted: artifacts could not be loaded");
        }
    };

    api::mark_artifacts_loaded(&health_registry).await;

    let info = estimator.model_info();
    logger.log_artifacts_loaded(
        &config.schema_path.display().to_string(),
        &config.model_path.display().to_string(),
        &info.format,
        estimator.schema().len(),
        info.location_count,
    );

    let app_state = Arc::new(api::AppState::new(
        estimator,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true);

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            result.context("API server stopped")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
