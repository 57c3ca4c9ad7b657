//! Load-once holder for the estimator context
//!
//! The schema and model never change while the process runs, so they are
//! loaded at most once and shared read-only afterwards. Concurrent first calls
//! wait on the same load; a failed load leaves the store empty so a later call
//! may try again.

use crate::error::{EstimatorError, Result};
use crate::estimator::{ArtifactConfig, Estimator};
use crate::observability::EstimatorMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

pub struct ArtifactStore {
    config: ArtifactConfig,
    cell: OnceCell<Arc<Estimator>>,
    loads: AtomicUsize,
    metrics: EstimatorMetrics,
}

impl ArtifactStore {
    pub fn new(config: ArtifactConfig, metrics: EstimatorMetrics) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
            loads: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Return the shared estimator, loading the artifacts on first use
    pub async fn get_or_load(&self) -> Result<Arc<Estimator>> {
        let estimator = self
            .cell
            .get_or_try_init(|| async {
                let estimator = Estimator::load(&self.config)?;
                self.loads.fetch_add(1, Ordering::SeqCst);

                let info = estimator.model_info();
                self.metrics.inc_artifact_loads();
                self.metrics.set_model_info(&info.format, info.feature_count);
                info!(
                    schema = %self.config.schema_path.display(),
                    model = %self.config.model_path.display(),
                    "Artifacts loaded"
                );
                Ok::<_, EstimatorError>(Arc::new(estimator))
            })
            .await?;
        Ok(estimator.clone())
    }

    /// The estimator if it has been loaded
    pub fn get(&self) -> Option<Arc<Estimator>> {
        self.cell.get().cloned()
    }

    /// Number of successful loads; never more than one
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PredictionRequest;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_artifacts(dir: &Path) -> ArtifactConfig {
        let schema_path = dir.join("columns.json");
        let model_path = dir.join("linear_model.json");
        std::fs::write(
            &schema_path,
            serde_json::json!({
                "data_columns": ["bhk", "total_sqft", "bath", "whitefield", "hebbal"]
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            &model_path,
            serde_json::json!({
                "coefficients": [5.0, 0.06, 2.0, 8.0, 12.0],
                "intercept": -3.0
            })
            .to_string(),
        )
        .unwrap();
        ArtifactConfig::new(schema_path, model_path)
    }

    #[tokio::test]
    async fn test_loads_once_across_many_queries() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(write_artifacts(dir.path()), EstimatorMetrics::new());

        for i in 0..100u32 {
            let estimator = store.get_or_load().await.unwrap();
            let request = PredictionRequest::new("Hebbal", 1000.0 + f64::from(i), 2, 2);
            estimator.handle_query(&request).unwrap();
        }

        assert_eq!(store.loads(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_calls_share_one_load() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ArtifactStore::new(
            write_artifacts(dir.path()),
            EstimatorMetrics::new(),
        ));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_load().await.unwrap() })
            })
            .collect();

        let mut loaded = Vec::new();
        for handle in handles {
            loaded.push(handle.await.unwrap());
        }

        assert_eq!(store.loads(), 1);
        assert!(loaded.iter().all(|e| Arc::ptr_eq(e, &loaded[0])));
    }

    #[tokio::test]
    async fn test_failed_load_leaves_store_empty() {
        let dir = TempDir::new().unwrap();
        let config = ArtifactConfig::new(
            dir.path().join("columns.json"),
            dir.path().join("linear_model.json"),
        );
        let store = ArtifactStore::new(config, EstimatorMetrics::new());

        let err = store.get_or_load().await.unwrap_err();
        assert!(matches!(err, EstimatorError::ArtifactNotFound { .. }));
        assert!(store.get().is_none());
        assert_eq!(store.loads(), 0);

        // Artifacts appear later; the next call loads them
        write_artifacts(dir.path());
        assert!(store.get_or_load().await.is_ok());
        assert_eq!(store.loads(), 1);
    }
}
