//! Error taxonomy for artifact loading and per-request estimation

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EstimatorError>;

#[derive(Debug, Error)]
pub enum EstimatorError {
    /// A startup artifact (schema or model) does not exist
    #[error("artifact not found: {}", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// Schema artifact is present but structurally invalid
    #[error("schema artifact malformed: {0}")]
    SchemaMalformed(String),

    /// Model artifact is present but cannot be turned into a runnable regressor
    #[error("model artifact malformed: {0}")]
    ModelMalformed(String),

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The model's predict call failed for one request
    #[error("inference failed: {0}")]
    Inference(String),

    /// User input rejected at the query boundary
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EstimatorError {
    /// Startup errors abort initialization; everything else is scoped to one request.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EstimatorError::Inference(_) | EstimatorError::InvalidRequest(_)
        )
    }

    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            EstimatorError::ArtifactNotFound { .. } => "artifact_not_found",
            EstimatorError::SchemaMalformed(_) => "schema_malformed",
            EstimatorError::ModelMalformed(_) => "model_malformed",
            EstimatorError::ChecksumMismatch { .. } => "checksum_mismatch",
            EstimatorError::Inference(_) => "inference_error",
            EstimatorError::InvalidRequest(_) => "invalid_request",
            EstimatorError::Io { .. } => "io_error",
        }
    }

    /// Map a failed artifact read, keeping "missing" distinct from other IO failures
    pub(crate) fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            EstimatorError::ArtifactNotFound { path }
        } else {
            EstimatorError::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_not_fatal() {
        assert!(!EstimatorError::Inference("shape".into()).is_fatal());
        assert!(!EstimatorError::InvalidRequest("sqft".into()).is_fatal());
        assert!(EstimatorError::SchemaMalformed("key".into()).is_fatal());
        assert!(EstimatorError::ArtifactNotFound {
            path: PathBuf::from("columns.json")
        }
        .is_fatal());
    }

    #[test]
    fn test_not_found_maps_to_artifact_not_found() {
        let err = EstimatorError::from_read(
            "missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, EstimatorError::ArtifactNotFound { .. }));
        assert_eq!(err.code(), "artifact_not_found");

        let err = EstimatorError::from_read(
            "locked.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, EstimatorError::Io { .. }));
    }
}
