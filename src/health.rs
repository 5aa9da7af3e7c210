use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub details: Option<serde_json::Value>,
    pub duration_ms: Option<u64>,
}

impl HealthCheckResult {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            details: None,
            duration_ms: None,
        }
    }

    pub fn healthy_with_details(details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            details: Some(details),
            duration_ms: None,
        }
    }

    pub fn unhealthy(message: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            details: None,
            duration_ms: None,
        }
    }

    pub fn unhealthy_with_details(message: String, details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message),
            details: Some(details),
            duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// The name of this health check component
    fn name(&self) -> &str;

    /// Perform the health check
    async fn check(&self) -> HealthCheckResult;

    /// Optional: return static information about this component
    fn info(&self) -> Option<serde_json::Value> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallHealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub checks: HashMap<String, HealthCheckResult>,
}

pub struct HealthService {
    checkers: Arc<RwLock<HashMap<String, Arc<dyn HealthChecker>>>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            checkers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a health checker for a specific component
    pub async fn register(&self, checker: Arc<dyn HealthChecker>) {
        let name = checker.name().to_string();
        let mut checkers = self.checkers.write().await;
        checkers.insert(name, checker);
    }

    /// Run every registered health check and aggregate the results
    pub async fn check_health(&self) -> OverallHealthResponse {
        let checkers = self.checkers.read().await;
        let mut results = HashMap::new();

        for (name, checker) in checkers.iter() {
            let start = Instant::now();
            let result = checker.check().await;
            let duration = start.elapsed().as_millis() as u64;
            results.insert(name.clone(), result.with_duration(duration));
        }

        let overall_status = if results
            .values()
            .any(|r| matches!(r.status, HealthStatus::Unhealthy))
        {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        };

        OverallHealthResponse {
            status: overall_status,
            service: "hubspot-connect".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks: results,
        }
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockHealthyChecker;

    #[async_trait]
    impl HealthChecker for MockHealthyChecker {
        fn name(&self) -> &str {
            "mock_healthy"
        }

        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy_with_details(json!({"test": "passed"}))
        }
    }

    struct MockUnhealthyChecker;

    #[async_trait]
    impl HealthChecker for MockUnhealthyChecker {
        fn name(&self) -> &str {
            "mock_unhealthy"
        }

        async fn check(&self) -> HealthCheckResult {
            HealthCheckResult::unhealthy("component down".to_string())
        }
    }

    #[tokio::test]
    async fn test_all_healthy() {
        let service = HealthService::new();
        service.register(Arc::new(MockHealthyChecker)).await;

        let response = service.check_health().await;
        assert!(matches!(response.status, HealthStatus::Healthy));
        assert_eq!(response.checks.len(), 1);
        assert!(response.checks.contains_key("mock_healthy"));
    }

    #[tokio::test]
    async fn test_one_unhealthy_makes_overall_unhealthy() {
        let service = HealthService::new();
        service.register(Arc::new(MockHealthyChecker)).await;
        service.register(Arc::new(MockUnhealthyChecker)).await;

        let response = service.check_health().await;
        assert!(matches!(response.status, HealthStatus::Unhealthy));
        assert_eq!(response.checks.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_service_is_healthy() {
        let service = HealthService::new();
        let response = service.check_health().await;
        assert!(matches!(response.status, HealthStatus::Healthy));
        assert!(response.checks.is_empty());
    }
}
