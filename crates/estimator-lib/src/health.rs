//! Component health for the liveness and readiness endpoints
//!
//! The schema and model components start unhealthy and turn healthy once the
//! artifacts have loaded. The inference component follows the most recent
//! predict call: a failure degrades it and the next success restores it,
//! without ever taking the service out of readiness.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Component names reported under `/healthz`
pub mod components {
    pub const SCHEMA: &str = "schema";
    pub const MODEL: &str = "model";
    pub const INFERENCE: &str = "inference";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still answering queries, but the last attempt failed
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    /// Healthy or degraded; liveness only fails on unhealthy
    pub fn is_operational(&self) -> bool {
        !matches!(self, ComponentStatus::Unhealthy)
    }

    fn severity(self) -> u8 {
        match self {
            ComponentStatus::Healthy => 0,
            ComponentStatus::Degraded => 1,
            ComponentStatus::Unhealthy => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn new(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components; healthy when none are registered
    pub fn overall(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|c| c.status)
            .max_by_key(|s| s.severity())
            .unwrap_or(ComponentStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReadinessResponse {
    fn not_ready(reason: &str) -> Self {
        Self {
            ready: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Shared, cloneable view of every component's health plus the ready flag
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<AtomicBool>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a component as healthy
    pub async fn register(&self, name: &str) {
        self.set(name, ComponentStatus::Healthy, None).await;
    }

    /// Start tracking a component that stays unhealthy until `set_healthy`
    pub async fn register_pending(&self, name: &str, reason: &str) {
        self.set(name, ComponentStatus::Unhealthy, Some(reason.to_string()))
            .await;
    }

    pub async fn set_healthy(&self, name: &str) {
        self.set(name, ComponentStatus::Healthy, None).await;
    }

    /// Record the outcome of one predict call.
    /// Successes only write when they change the status.
    pub async fn record_inference(&self, outcome: std::result::Result<(), &str>) {
        match outcome {
            Ok(()) => {
                let current = self
                    .components
                    .read()
                    .await
                    .get(components::INFERENCE)
                    .map(|c| c.status);
                if current != Some(ComponentStatus::Healthy) {
                    self.set_healthy(components::INFERENCE).await;
                }
            }
            Err(reason) => {
                self.set(
                    components::INFERENCE,
                    ComponentStatus::Degraded,
                    Some(format!("last predict failed: {}", reason)),
                )
                .await;
            }
        }
    }

    /// Flip once the artifacts are loaded and the router is built
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        HealthResponse {
            status: HealthResponse::overall(&components),
            components,
        }
    }

    /// Ready once artifacts are loaded and no component is unhealthy.
    /// A degraded inference component does not affect readiness.
    pub async fn readiness(&self) -> ReadinessResponse {
        if !self.ready.load(Ordering::SeqCst) {
            return ReadinessResponse::not_ready("Artifacts not yet loaded");
        }

        match self.health().await.status {
            ComponentStatus::Unhealthy => {
                ReadinessResponse::not_ready("Critical component unhealthy")
            }
            _ => ReadinessResponse {
                ready: true,
                reason: None,
            },
        }
    }

    async fn set(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        self.components
            .write()
            .await
            .insert(name.to_string(), ComponentHealth::new(status, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry_with_all() -> HealthRegistry {
        let registry = HealthRegistry::new();
        registry.register(components::SCHEMA).await;
        registry.register(components::MODEL).await;
        registry.register(components::INFERENCE).await;
        registry
    }

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let health = HealthRegistry::new().health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_registered_components_start_healthy() {
        let health = registry_with_all().await.health().await;
        assert_eq!(health.components.len(), 3);
        assert!(health
            .components
            .values()
            .all(|c| c.status == ComponentStatus::Healthy && c.message.is_none()));
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_then_recovers() {
        let registry = registry_with_all().await;

        registry.record_inference(Err("dimension mismatch")).await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.status.is_operational());
        assert!(health.components[components::INFERENCE]
            .message
            .as_deref()
            .unwrap()
            .contains("dimension mismatch"));

        registry.record_inference(Ok(())).await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components[components::INFERENCE].message.is_none());
    }

    #[tokio::test]
    async fn test_degraded_inference_keeps_service_ready() {
        let registry = registry_with_all().await;
        registry.set_ready(true);

        registry.record_inference(Err("boom")).await;
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_unhealthy_component_wins() {
        let registry = registry_with_all().await;
        registry.record_inference(Err("boom")).await;
        registry.register_pending(components::MODEL, "model file missing").await;

        let status = registry.health().await.status;
        assert_eq!(status, ComponentStatus::Unhealthy);
        assert!(!status.is_operational());
    }

    #[tokio::test]
    async fn test_pending_component_unhealthy_until_loaded() {
        let registry = HealthRegistry::new();
        registry.register_pending(components::MODEL, "not loaded").await;
        registry.register(components::INFERENCE).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(
            health.components[components::MODEL].message.as_deref(),
            Some("not loaded")
        );

        registry.set_healthy(components::MODEL).await;
        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components[components::MODEL].message.is_none());
    }

    #[tokio::test]
    async fn test_not_ready_before_artifacts_load() {
        let readiness = registry_with_all().await.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Artifacts not yet loaded"));
    }

    #[tokio::test]
    async fn test_not_ready_when_component_unhealthy() {
        let registry = registry_with_all().await;
        registry.set_ready(true);
        registry.register_pending(components::SCHEMA, "columns file unreadable").await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Critical component unhealthy"));
    }
}
