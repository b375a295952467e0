//! Services manager for long-running components.
//!
//! Services register with the manager and are started/stopped together.
//! Start order respects [dependencies](Service::dependencies); a service is only
//! started after all of its dependencies. Stop order is the reverse.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Health status of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a service health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// A service that can be started, stopped and health-checked by the manager.
///
/// Use [tracing] for lifecycle logging and include the service name as a
/// field (e.g. `tracing::info!(service = "store", "Started")`) so logs are
/// filterable.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Unique name for logging and lookup (e.g. "store", "http").
    fn name(&self) -> &str;

    /// Names of services that must be started before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    /// Report current health. Default returns [ServiceHealth::healthy].
    async fn health(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

/// Registry and lifecycle controller for services.
#[derive(Default)]
pub struct ServicesManager {
    services: RwLock<HashMap<String, Arc<dyn Service>>>,
    started: RwLock<HashSet<String>>,
}

impl ServicesManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Does not start it. A service with the same name is replaced.
    pub async fn register(&self, service: Arc<dyn Service>) {
        let name = service.name().to_string();
        let mut guard = self.services.write().await;
        if guard.insert(name.clone(), service).is_some() {
            warn!(service = %name, "Service reregistered, overwriting previous");
        } else {
            info!(service = %name, "Service registered");
        }
    }

    pub async fn is_started(&self, name: &str) -> bool {
        self.started.read().await.contains(name)
    }

    /// Compute start order from dependencies (topological order). Returns an error on unknown deps or cycles.
    async fn start_order(&self) -> Result<Vec<String>> {
        let guard = self.services.read().await;
        let names: HashSet<String> = guard.keys().cloned().collect();
        let mut deps: HashMap<String, Vec<String>> = HashMap::new();
        for (name, svc) in guard.iter() {
            let d = svc.dependencies();
            for dep in &d {
                if !names.contains(dep) {
                    anyhow::bail!("Service {} depends on {} which is not registered", name, dep);
                }
            }
            deps.insert(name.clone(), d);
        }
        drop(guard);

        // Kahn's algorithm: dependencies first.
        let mut in_degree: HashMap<String, usize> = deps
            .iter()
            .map(|(name, d)| (name.clone(), d.len()))
            .collect();
        let mut dependents: HashMap<String, Vec<String>> =
            names.iter().map(|n| (n.clone(), Vec::new())).collect();
        for (name, d) in &deps {
            for dep in d {
                if let Some(list) = dependents.get_mut(dep) {
                    list.push(name.clone());
                }
            }
        }
        let mut queue: Vec<String> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| n.clone())
            .collect();
        queue.sort();

        let mut order = Vec::with_capacity(names.len());
        while let Some(n) = queue.pop() {
            for s in dependents.get(&n).map(Vec::as_slice).unwrap_or_default() {
                if let Some(deg) = in_degree.get_mut(s) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push(s.clone());
                    }
                }
            }
            order.push(n);
        }
        if order.len() != names.len() {
            anyhow::bail!("Service dependency cycle detected");
        }
        Ok(order)
    }

    /// Start all registered services in dependency order.
    pub async fn start_all(&self) -> Result<()> {
        let order = self.start_order().await?;
        for name in &order {
            let svc = self.services.read().await.get(name).cloned();
            if let Some(s) = svc {
                if let Err(e) = s.start().await {
                    warn!(service = %name, error = %e, "Service start failed");
                    return Err(e).context(format!("failed to start service {}", name));
                }
                self.started.write().await.insert(name.clone());
                info!(service = %name, "Service started");
            }
        }
        Ok(())
    }

    /// Stop all started services in reverse dependency order. Stop failures are logged, not returned.
    pub async fn stop_all(&self) -> Result<()> {
        let order = self.start_order().await?;
        for name in order.into_iter().rev() {
            if !self.is_started(&name).await {
                continue;
            }
            let svc = self.services.read().await.get(&name).cloned();
            if let Some(s) = svc {
                if let Err(e) = s.stop().await {
                    warn!(service = %name, error = %e, "Service stop failed");
                } else {
                    info!(service = %name, "Service stopped");
                }
                self.started.write().await.remove(&name);
            }
        }
        Ok(())
    }

    /// Health check for all registered services. A service that is not
    /// started, or whose check errors, is reported unhealthy.
    pub async fn health_all(&self) -> HashMap<String, ServiceHealth> {
        let services: Vec<(String, Arc<dyn Service>)> = self
            .services
            .read()
            .await
            .iter()
            .map(|(n, s)| (n.clone(), s.clone()))
            .collect();

        let mut out = HashMap::new();
        for (name, svc) in services {
            let health = if !self.is_started(&name).await {
                ServiceHealth::unhealthy("not started")
            } else {
                match svc.health().await {
                    Ok(h) => h,
                    Err(e) => ServiceHealth::unhealthy(e.to_string()),
                }
            };
            out.insert(name, health);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct Recording {
        name: &'static str,
        deps: Vec<String>,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }

        async fn start(&self) -> Result<()> {
            self.log.lock().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.log.lock().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    fn recording(
        name: &'static str,
        deps: &[&str],
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn Service> {
        Arc::new(Recording {
            name,
            deps: deps.iter().map(|d| d.to_string()).collect(),
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn test_start_and_stop_follow_dependencies() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recording("http", &["store"], &log)).await;
        manager.register(recording("store", &[], &log)).await;

        manager.start_all().await.unwrap();
        assert!(manager.is_started("http").await);
        manager.stop_all().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["start store", "start http", "stop http", "stop store"]
        );
    }

    #[tokio::test]
    async fn test_unknown_dependency_is_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recording("http", &["store"], &log)).await;
        assert!(manager.start_all().await.is_err());
    }

    #[tokio::test]
    async fn test_cycle_is_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recording("a", &["b"], &log)).await;
        manager.register(recording("b", &["a"], &log)).await;
        assert!(manager.start_all().await.is_err());
    }

    #[tokio::test]
    async fn test_health_reports_not_started() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(recording("store", &[], &log)).await;

        let health = manager.health_all().await;
        assert!(!health["store"].is_healthy());

        manager.start_all().await.unwrap();
        let health = manager.health_all().await;
        assert!(health["store"].is_healthy());
    }
}
