//! Core library for the home price estimator
//!
//! This crate provides:
//! - Feature schema loading and validation
//! - One-hot feature encoding of price queries
//! - Frozen regression model inference (ONNX via tract, JSON linear models)
//! - A load-once artifact store shared by request handlers
//! - Health checks and observability

pub mod error;
pub mod estimator;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schema;
pub mod store;

pub use error::{EstimatorError, Result};
pub use estimator::{ArtifactConfig, Estimator};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use schema::FeatureSchema;
pub use store::ArtifactStore;
