//! Request orchestration
//!
//! `Estimator` is the immutable context built once at startup: the feature
//! schema and the frozen model. Request handlers borrow it to run a query.

use crate::error::{EstimatorError, Result};
use crate::models::{ModelInfo, PredictionRequest, PredictionResult};
use crate::predictor::{self, encode_request, load_model, ModelFormat, Regressor};
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Where the startup artifacts live and how to read them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub schema_path: PathBuf,
    pub model_path: PathBuf,
    /// Inferred from the model file extension when unset
    #[serde(default)]
    pub model_format: Option<ModelFormat>,
    /// Hex SHA-256 the model file must match
    #[serde(default)]
    pub model_sha256: Option<String>,
}

impl ArtifactConfig {
    pub fn new(schema_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: schema_path.into(),
            model_path: model_path.into(),
            model_format: None,
            model_sha256: None,
        }
    }

    pub fn resolved_format(&self) -> ModelFormat {
        self.model_format
            .unwrap_or_else(|| ModelFormat::from_path(&self.model_path))
    }
}

pub struct Estimator {
    schema: FeatureSchema,
    model: Box<dyn Regressor>,
    checksum: Option<String>,
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("columns", &self.schema.len())
            .field("model", &self.model.format())
            .field("checksum", &self.checksum)
            .finish()
    }
}

impl Estimator {
    /// Pair a schema with a model, rejecting width mismatches up front
    pub fn new(schema: FeatureSchema, model: Box<dyn Regressor>) -> Result<Self> {
        if model.feature_count() != schema.len() {
            return Err(EstimatorError::ModelMalformed(format!(
                "model expects {} features but schema has {} columns",
                model.feature_count(),
                schema.len()
            )));
        }
        Ok(Self {
            schema,
            model,
            checksum: None,
        })
    }

    /// Load schema then model. Any failure aborts; nothing is partially ready.
    pub fn load(config: &ArtifactConfig) -> Result<Self> {
        let schema = FeatureSchema::load(&config.schema_path)?;
        let loaded = load_model(
            &config.model_path,
            config.resolved_format(),
            schema.len(),
            config.model_sha256.as_deref(),
        )?;

        let mut estimator = Self::new(schema, loaded.regressor)?;
        estimator.checksum = Some(loaded.checksum);
        Ok(estimator)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            format: self.model.format().to_string(),
            feature_count: self.model.feature_count(),
            location_count: self.schema.location_count(),
            checksum: self.checksum.clone(),
        }
    }

    /// Encode the query, run the model, and format the result
    pub fn handle_query(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        let encoded = encode_request(request, &self.schema);
        if !encoded.location_known() {
            debug!(location = %request.location, "Location not in schema, encoding without location signal");
        }

        let price = predictor::estimate(&encoded.vector, self.model.as_ref())?;

        Ok(PredictionResult {
            price_lakhs: price,
            display: predictor::format_lakhs(price),
            location: request.location.clone(),
            location_known: encoded.location_known(),
            model: self.model.format().to_string(),
            generated_at: chrono::Utc::now().timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureVector;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const COLUMNS: [&str; 5] = [
        "bhk",
        "total_sqft",
        "bath",
        "1st phase jp nagar",
        "indira nagar",
    ];

    /// Returns a scripted value and remembers every row it saw
    struct RecordingRegressor {
        output: f64,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl RecordingRegressor {
        fn new(output: f64) -> Self {
            Self {
                output,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Regressor for RecordingRegressor {
        fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>> {
            let mut seen = self.seen.lock().unwrap();
            seen.extend(batch.iter().map(|row| row.as_slice().to_vec()));
            Ok(vec![self.output; batch.len()])
        }

        fn feature_count(&self) -> usize {
            COLUMNS.len()
        }

        fn format(&self) -> &str {
            "recording"
        }
    }

    impl Regressor for Arc<RecordingRegressor> {
        fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>> {
            self.as_ref().predict(batch)
        }

        fn feature_count(&self) -> usize {
            self.as_ref().feature_count()
        }

        fn format(&self) -> &str {
            self.as_ref().format()
        }
    }

    fn recording_estimator(output: f64) -> (Estimator, Arc<RecordingRegressor>) {
        let recorder = Arc::new(RecordingRegressor::new(output));
        let schema = FeatureSchema::from_columns(COLUMNS).unwrap();
        let estimator = Estimator::new(schema, Box::new(recorder.clone())).unwrap();
        (estimator, recorder)
    }

    #[test]
    fn test_end_to_end_known_location() {
        let (estimator, recorder) = recording_estimator(95.23);
        let result = estimator
            .handle_query(&PredictionRequest::new("Indira Nagar", 1200.0, 2, 2))
            .unwrap();

        assert_eq!(recorder.seen.lock().unwrap()[0], vec![2.0, 1200.0, 2.0, 0.0, 1.0]);
        assert_eq!(result.price_lakhs, 95.23);
        assert_eq!(result.display, "₹ 95.23 Lakhs");
        assert!(result.location_known);
    }

    #[test]
    fn test_end_to_end_unknown_location() {
        let (estimator, recorder) = recording_estimator(61.0);
        let result = estimator
            .handle_query(&PredictionRequest::new("Mars Colony", 1000.0, 3, 3))
            .unwrap();

        assert_eq!(recorder.seen.lock().unwrap()[0], vec![3.0, 1000.0, 3.0, 0.0, 0.0]);
        assert!(!result.location_known);
        assert_eq!(result.display, "₹ 61.00 Lakhs");
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let schema = FeatureSchema::from_columns(COLUMNS).unwrap();
        let model = crate::predictor::LinearRegressor::new(vec![1.0; 3], 0.0).unwrap();
        let err = Estimator::new(schema, Box::new(model)).unwrap_err();
        assert!(matches!(err, EstimatorError::ModelMalformed(_)));
    }

    #[test]
    fn test_load_from_artifacts() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("columns.json");
        let model_path = dir.path().join("linear_model.json");
        std::fs::write(&schema_path, serde_json::json!({ "data_columns": COLUMNS }).to_string())
            .unwrap();
        std::fs::write(
            &model_path,
            serde_json::json!({
                "coefficients": [2.0, 0.05, 3.0, -10.0, 15.0],
                "intercept": 4.0
            })
            .to_string(),
        )
        .unwrap();

        let estimator = Estimator::load(&ArtifactConfig::new(&schema_path, &model_path)).unwrap();
        let info = estimator.model_info();
        assert_eq!(info.format, "linear_json");
        assert_eq!(info.feature_count, 5);
        assert_eq!(info.location_count, 2);
        assert!(info.checksum.is_some());

        let result = estimator
            .handle_query(&PredictionRequest::new("indira nagar", 1200.0, 2, 2))
            .unwrap();
        assert_eq!(result.price_lakhs, 89.0);
    }

    #[test]
    fn test_load_fails_on_missing_schema_key() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("columns.json");
        std::fs::write(&schema_path, r#"{"columns": []}"#).unwrap();

        let err = Estimator::load(&ArtifactConfig::new(&schema_path, dir.path().join("m.json")))
            .unwrap_err();
        assert!(matches!(err, EstimatorError::SchemaMalformed(_)));
    }

    #[test]
    fn test_load_fails_on_missing_model() {
        let dir = TempDir::new().unwrap();
        let schema_path = dir.path().join("columns.json");
        std::fs::write(&schema_path, serde_json::json!({ "data_columns": COLUMNS }).to_string())
            .unwrap();

        let err = Estimator::load(&ArtifactConfig::new(&schema_path, dir.path().join("model.onnx")))
            .unwrap_err();
        assert!(matches!(err, EstimatorError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_resolved_format() {
        let mut config = ArtifactConfig::new("columns.json", "model.onnx");
        assert_eq!(config.resolved_format(), ModelFormat::Onnx);
        config.model_format = Some(ModelFormat::LinearJson);
        assert_eq!(config.resolved_format(), ModelFormat::LinearJson);
    }
}
