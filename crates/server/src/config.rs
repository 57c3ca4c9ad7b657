//! Server configuration

use anyhow::{Context, Result};
use estimator_lib::{predictor::ModelFormat, ArtifactConfig};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_SCHEMA_PATH: &str = "artifacts/columns.json";
pub const DEFAULT_MODEL_PATH: &str = "artifacts/linear_model.json";
pub const DEFAULT_API_PORT: u16 = 8080;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorConfig {
    /// Feature schema artifact (`{"data_columns": [...]}`)
    pub schema_path: PathBuf,

    /// Model artifact
    pub model_path: PathBuf,

    /// Model decoder; inferred from the model file extension when unset
    #[serde(default)]
    pub model_format: Option<ModelFormat>,

    /// Hex SHA-256 the model file must match
    #[serde(default)]
    pub model_sha256: Option<String>,

    /// Port for the query API and health/metrics endpoints
    pub api_port: u16,

    /// Tag attached to structured log events
    pub instance_name: String,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

impl EstimatorConfig {
    /// Load configuration from an optional `estimator.{toml,json,yaml}` file
    /// and `ESTIMATOR_*` environment variables, in that order of precedence
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .set_default("schema_path", DEFAULT_SCHEMA_PATH)?
            .set_default("model_path", DEFAULT_MODEL_PATH)?
            .set_default("api_port", i64::from(DEFAULT_API_PORT))?
            .set_default("instance_name", default_instance_name())?
            .add_source(config::File::with_name("estimator").required(false))
            .add_source(config::Environment::with_prefix("ESTIMATOR"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Invalid estimator configuration")
    }

    pub fn artifacts(&self) -> ArtifactConfig {
        ArtifactConfig {
            schema_path: self.schema_path.clone(),
            model_path: self.model_path.clone(),
            model_format: self.model_format,
            model_sha256: self.model_sha256.clone(),
        }
    }
}
