//! Core data models for the price estimator

use crate::error::{EstimatorError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// The four user inputs of one price query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub location: String,
    pub sqft: f64,
    pub bhk: u32,
    pub bath: u32,
}

impl PredictionRequest {
    pub fn new(location: impl Into<String>, sqft: f64, bhk: u32, bath: u32) -> Self {
        Self {
            location: location.into(),
            sqft,
            bhk,
            bath,
        }
    }

    /// Boundary check for user input. The encoder itself accepts anything.
    pub fn validate(&self) -> Result<()> {
        if !self.sqft.is_finite() || self.sqft <= 0.0 {
            return Err(EstimatorError::InvalidRequest(format!(
                "sqft must be a positive number, got {}",
                self.sqft
            )));
        }
        if self.bhk == 0 {
            return Err(EstimatorError::InvalidRequest(
                "bhk must be at least 1".to_string(),
            ));
        }
        if self.bath == 0 {
            return Err(EstimatorError::InvalidRequest(
                "bath must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dense model input, one slot per schema column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn set(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.values[index]
    }
}

/// Rounded price estimate returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Estimate in Lakhs, rounded to 2 decimal places
    pub price_lakhs: f64,
    /// Display form, e.g. `₹ 95.23 Lakhs`
    pub display: String,
    pub location: String,
    /// False when the location was not in the schema and encoded as all-zero
    pub location_known: bool,
    pub model: String,
    pub generated_at: i64,
}

/// Description of the loaded artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub format: String,
    pub feature_count: usize,
    pub location_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}
