//! Frozen regression models
//!
//! Two artifact formats are supported: ONNX graphs run through tract, and a
//! plain JSON linear model (`coefficients` + `intercept`). Both are loaded once
//! at startup and only read afterwards.

use super::Regressor;
use crate::error::{EstimatorError, Result};
use crate::models::FeatureVector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::{debug, info};

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// On-disk model encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    Onnx,
    LinearJson,
}

impl ModelFormat {
    /// `.onnx` files are ONNX graphs, anything else is read as a JSON linear model
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => ModelFormat::Onnx,
            _ => ModelFormat::LinearJson,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Onnx => "onnx",
            ModelFormat::LinearJson => "linear_json",
        }
    }
}

/// A regressor ready to serve, plus the digest of the bytes it came from
pub struct LoadedModel {
    pub regressor: Box<dyn Regressor>,
    pub checksum: String,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("format", &self.regressor.format())
            .field("feature_count", &self.regressor.feature_count())
            .field("checksum", &self.checksum)
            .finish()
    }
}

/// Read, verify, and decode the model artifact at `path`.
///
/// `feature_count` is the schema width; a model expecting a different width is
/// rejected here instead of failing every request later.
pub fn load_model(
    path: &Path,
    format: ModelFormat,
    feature_count: usize,
    expected_sha256: Option<&str>,
) -> Result<LoadedModel> {
    let bytes = std::fs::read(path).map_err(|e| EstimatorError::from_read(path, e))?;

    let checksum = compute_checksum(&bytes);
    if let Some(expected) = expected_sha256 {
        if !expected.eq_ignore_ascii_case(&checksum) {
            return Err(EstimatorError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: expected.to_string(),
                actual: checksum,
            });
        }
    }

    let regressor: Box<dyn Regressor> = match format {
        ModelFormat::Onnx => Box::new(OnnxRegressor::from_bytes(&bytes, feature_count)?),
        ModelFormat::LinearJson => Box::new(LinearRegressor::from_bytes(&bytes)?),
    };

    if regressor.feature_count() != feature_count {
        return Err(EstimatorError::ModelMalformed(format!(
            "model expects {} features but schema has {} columns",
            regressor.feature_count(),
            feature_count
        )));
    }

    info!(
        path = %path.display(),
        format = format.as_str(),
        features = feature_count,
        checksum = %checksum,
        "Model loaded"
    );

    Ok(LoadedModel {
        regressor,
        checksum,
    })
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn check_width(vector: &FeatureVector, expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(EstimatorError::Inference(format!(
            "feature vector has {} values, model expects {}",
            vector.len(),
            expected
        )));
    }
    Ok(())
}

/// ONNX regressor run through tract.
///
/// The plan is optimized for one row of `f32[1, N]`; a batch runs row by row.
pub struct OnnxRegressor {
    model: TractModel,
    feature_count: usize,
}

impl OnnxRegressor {
    pub fn from_bytes(model_bytes: &[u8], feature_count: usize) -> Result<Self> {
        let model = Self::load_model(model_bytes, feature_count)
            .map_err(|e| EstimatorError::ModelMalformed(format!("{:#}", e)))?;
        Ok(Self {
            model,
            feature_count,
        })
    }

    /// Load and optimize an ONNX model with a single-row input of `feature_count` floats
    fn load_model(model_bytes: &[u8], feature_count: usize) -> TractResult<TractModel> {
        tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))?
            .with_input_fact(0, f32::fact([1, feature_count]).into())?
            .into_optimized()?
            .into_runnable()
    }

    fn run_row(&self, features: &FeatureVector) -> TractResult<f64> {
        let data: Vec<f32> = features.as_slice().iter().map(|&x| x as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.feature_count), data)?.into();

        let result = self.model.run(tvec!(input.into()))?;
        let output = result
            .first()
            .ok_or_else(|| anyhow::anyhow!("no output from model"))?;
        let value = output
            .to_array_view::<f32>()?
            .iter()
            .next()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("model output is empty"))?;
        Ok(f64::from(value))
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>> {
        batch
            .iter()
            .map(|row| {
                check_width(row, self.feature_count)?;
                self.run_row(row)
                    .map_err(|e| EstimatorError::Inference(format!("{:#}", e)))
            })
            .collect()
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }

    fn format(&self) -> &str {
        ModelFormat::Onnx.as_str()
    }
}

/// Linear model: `intercept + Σ coefficients[i] * x[i]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(EstimatorError::ModelMalformed(
                "linear model has no coefficients".to_string(),
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(EstimatorError::ModelMalformed(
                "linear model contains non-finite weights".to_string(),
            ));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let parsed: LinearRegressor = serde_json::from_slice(raw)
            .map_err(|e| EstimatorError::ModelMalformed(format!("invalid linear model JSON: {}", e)))?;
        debug!(coefficients = parsed.coefficients.len(), "Parsed linear model");
        Self::new(parsed.coefficients, parsed.intercept)
    }
}

impl Regressor for LinearRegressor {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>> {
        batch
            .iter()
            .map(|row| {
                check_width(row, self.coefficients.len())?;
                let dot: f64 = row
                    .as_slice()
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(x, w)| x * w)
                    .sum();
                Ok(self.intercept + dot)
            })
            .collect()
    }

    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn format(&self) -> &str {
        ModelFormat::LinearJson.as_str()
    }
}
