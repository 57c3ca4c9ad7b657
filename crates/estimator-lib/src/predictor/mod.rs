//! Encode → predict → format pipeline

mod features;
mod inference;
mod output;

pub use features::{encode, encode_request, EncodedQuery};
pub use inference::{
    compute_checksum, load_model, LinearRegressor, LoadedModel, ModelFormat, OnnxRegressor,
};
pub use output::{finalize_price, format_lakhs, round_to_cents, MIN_PRICE_LAKHS};

use crate::error::{EstimatorError, Result};
use crate::models::FeatureVector;
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

/// A frozen regression model
pub trait Regressor: Send + Sync {
    /// Predict one scalar per row of `batch`
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<f64>>;

    /// Width of the input rows the model accepts
    fn feature_count(&self) -> usize;

    /// Artifact format name
    fn format(&self) -> &str;
}

/// Run `vector` through `model` as a single-row batch and round the output
pub fn estimate(vector: &FeatureVector, model: &dyn Regressor) -> Result<f64> {
    let start = Instant::now();

    let batch = std::slice::from_ref(vector);
    let outputs = model.predict(batch)?;
    let raw = outputs
        .first()
        .copied()
        .ok_or_else(|| EstimatorError::Inference("model returned no output".to_string()))?;

    let elapsed = start.elapsed();
    if elapsed.as_millis() > MAX_INFERENCE_MS {
        warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
    } else {
        debug!(elapsed_us = elapsed.as_micros(), raw_output = raw, "Inference completed");
    }

    finalize_price(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRegressor(Vec<f64>);

    impl Regressor for FixedRegressor {
        fn predict(&self, _batch: &[FeatureVector]) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }

        fn feature_count(&self) -> usize {
            5
        }

        fn format(&self) -> &str {
            "fixed"
        }
    }

    struct FailingRegressor;

    impl Regressor for FailingRegressor {
        fn predict(&self, _batch: &[FeatureVector]) -> Result<Vec<f64>> {
            Err(EstimatorError::Inference("shape mismatch".to_string()))
        }

        fn feature_count(&self) -> usize {
            5
        }

        fn format(&self) -> &str {
            "failing"
        }
    }

    fn row() -> FeatureVector {
        FeatureVector::from_values(vec![2.0, 1200.0, 2.0, 0.0, 1.0])
    }

    #[test]
    fn test_estimate_rounds_first_output() {
        let model = FixedRegressor(vec![95.2312]);
        assert_eq!(estimate(&row(), &model).unwrap(), 95.23);
    }

    #[test]
    fn test_estimate_empty_output() {
        let model = FixedRegressor(vec![]);
        assert!(matches!(estimate(&row(), &model), Err(EstimatorError::Inference(_))));
    }

    #[test]
    fn test_estimate_propagates_model_failure() {
        let err = estimate(&row(), &FailingRegressor).unwrap_err();
        assert!(matches!(err, EstimatorError::Inference(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_estimate_with_linear_model_width_mismatch() {
        let model = LinearRegressor::new(vec![1.0; 7], 0.0).unwrap();
        assert!(matches!(estimate(&row(), &model), Err(EstimatorError::Inference(_))));
    }
}
