//! # Instance-List Providers
//!
//! The selectors treat the service registry as an injected provider of
//! per-request instance snapshots. Reactive call sites consume the async
//! [`InstanceSupplier`]; blocking call sites take a [`SyncInstanceSupplier`]
//! snapshot. Real registry clients (Nacos, Consul, Kubernetes, ...) live in
//! the embedding application and implement these traits; the in-memory
//! [`StaticInstanceSupplier`] covers tests and simple deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::core::error::IsolationResult;
use crate::core::types::ServiceInstance;

/// Async single-shot instance-list fetch for a named service
#[async_trait]
pub trait InstanceSupplier: Send + Sync {
    /// Current instances registered under `service`
    async fn instances(&self, service: &str) -> IsolationResult<Vec<ServiceInstance>>;
}

/// Synchronous snapshot of the instance list for a named service
pub trait SyncInstanceSupplier: Send + Sync {
    /// Current instances registered under `service`; empty when none
    fn snapshot(&self, service: &str) -> Vec<ServiceInstance>;
}

/// In-memory instance registry for testing and simple deployments
pub struct StaticInstanceSupplier {
    instances: DashMap<String, ServiceInstance>,
}

impl StaticInstanceSupplier {
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
        }
    }

    /// Add or replace an instance, keyed by its id
    pub fn register(&self, instance: ServiceInstance) {
        debug!(instance_id = %instance.id, service = %instance.service, "registered static instance");
        self.instances.insert(instance.id.clone(), instance);
    }

    /// Remove an instance by id
    pub fn deregister(&self, instance_id: &str) {
        self.instances.remove(instance_id);
    }

    /// Update the liveness flags of a registered instance
    pub fn set_liveness(&self, instance_id: &str, alive: bool, ready_to_serve: bool) {
        if let Some(mut instance) = self.instances.get_mut(instance_id) {
            instance.alive = alive;
            instance.ready_to_serve = ready_to_serve;
        }
    }

    fn of_service(&self, service: &str) -> Vec<ServiceInstance> {
        self.instances
            .iter()
            .filter(|entry| entry.value().service == service)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for StaticInstanceSupplier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InstanceSupplier for StaticInstanceSupplier {
    async fn instances(&self, service: &str) -> IsolationResult<Vec<ServiceInstance>> {
        Ok(self.of_service(service))
    }
}

impl SyncInstanceSupplier for StaticInstanceSupplier {
    fn snapshot(&self, service: &str) -> Vec<ServiceInstance> {
        self.of_service(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_fetch() {
        let supplier = StaticInstanceSupplier::new();
        supplier.register(ServiceInstance::new("orders", "10.0.0.1", 8080));
        supplier.register(ServiceInstance::new("billing", "10.0.0.2", 8080));

        let orders = supplier.instances("orders").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].host, "10.0.0.1");

        assert!(supplier.instances("unknown-service").await.unwrap().is_empty());
    }

    #[test]
    fn test_deregister() {
        let supplier = StaticInstanceSupplier::new();
        let instance = ServiceInstance::new("orders", "10.0.0.1", 8080);
        let id = instance.id.clone();
        supplier.register(instance);
        supplier.deregister(&id);

        assert!(supplier.snapshot("orders").is_empty());
    }

    #[test]
    fn test_set_liveness() {
        let supplier = StaticInstanceSupplier::new();
        let instance = ServiceInstance::new("orders", "10.0.0.1", 8080);
        let id = instance.id.clone();
        supplier.register(instance);
        supplier.set_liveness(&id, false, false);

        let snapshot = supplier.snapshot("orders");
        assert!(!snapshot[0].alive);
        assert!(!snapshot[0].ready_to_serve);
    }
}
