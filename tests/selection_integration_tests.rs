//! # Selection Integration Tests
//!
//! End-to-end selection scenarios: a static registry, requests with real
//! proxy headers, and both selector variants wired the way an embedding
//! gateway would wire them.

use axum::http::HeaderMap;
use isolation_lb::{
    IsolationBalancer, LoadBalancer, RandomSource, RequestContext, RetryingIsolationBalancer,
    SeededRandom, ServiceInstance, StaticInstanceSupplier, LOCAL_INSTANCE_METADATA_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Walks the pool in order so liveness retries visit every instance
struct CyclingRandom(AtomicUsize);

impl RandomSource for CyclingRandom {
    fn index(&self, bound: usize) -> usize {
        self.0.fetch_add(1, Ordering::Relaxed) % bound
    }
}

fn request_from(ip: &str) -> RequestContext {
    let mut headers = HeaderMap::new();
    headers.insert("x-real-ip", ip.parse().unwrap());
    RequestContext::new(headers, None)
}

fn registry() -> Arc<StaticInstanceSupplier> {
    let supplier = Arc::new(StaticInstanceSupplier::new());
    supplier.register(
        ServiceInstance::new("orders", "127.0.0.1", 8080)
            .with_metadata(LOCAL_INSTANCE_METADATA_KEY, "local-instance"),
    );
    supplier.register(ServiceInstance::new("orders", "10.0.0.5", 8080));
    supplier.register(ServiceInstance::new("orders", "10.0.0.6", 8080));
    supplier
}

#[tokio::test]
async fn developer_request_loops_back_to_local_instance() {
    let balancer = IsolationBalancer::new("orders", registry());

    let chosen = balancer.choose(&request_from("127.0.0.1")).await.unwrap();
    assert_eq!(chosen.host, "127.0.0.1");
    assert!(chosen.is_local());
}

#[tokio::test]
async fn production_request_never_lands_on_local_instance() {
    let balancer = IsolationBalancer::with_random(
        "orders",
        registry(),
        Arc::new(SeededRandom::new(11)),
    );

    for _ in 0..50 {
        let chosen = balancer.choose(&request_from("10.0.0.99")).await.unwrap();
        assert!(!chosen.is_local());
    }
}

#[tokio::test]
async fn unresolvable_origin_degrades_to_random_pass() {
    let balancer = IsolationBalancer::new("orders", registry());

    // "unknown" placeholders in every header tier resolve to an empty
    // origin, which can never match a local instance.
    let mut headers = HeaderMap::new();
    headers.insert("x-real-ip", "unknown".parse().unwrap());
    headers.insert("x-forwarded-for", "UNKNOWN".parse().unwrap());
    let chosen = balancer
        .choose(&RequestContext::new(headers, None))
        .await
        .unwrap();
    assert!(!chosen.is_local());
}

#[tokio::test]
async fn forwarding_chain_resolves_to_first_hop() {
    let supplier = Arc::new(StaticInstanceSupplier::new());
    supplier.register(
        ServiceInstance::new("orders", "10.0.0.1", 8080)
            .with_metadata(LOCAL_INSTANCE_METADATA_KEY, "local-instance"),
    );
    supplier.register(ServiceInstance::new("orders", "10.0.0.8", 8080));
    let balancer = IsolationBalancer::new("orders", supplier);

    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", "10.0.0.1,10.0.0.2".parse().unwrap());
    let chosen = balancer
        .choose(&RequestContext::new(headers, None))
        .await
        .unwrap();
    assert_eq!(chosen.host, "10.0.0.1");
}

#[tokio::test]
async fn empty_registry_yields_no_server() {
    let balancer = IsolationBalancer::new("orders", Arc::new(StaticInstanceSupplier::new()));

    assert!(balancer.choose(&request_from("10.0.0.1")).await.is_none());
}

#[tokio::test]
async fn all_local_registry_yields_no_server_for_foreign_origin() {
    let supplier = Arc::new(StaticInstanceSupplier::new());
    supplier.register(
        ServiceInstance::new("orders", "127.0.0.1", 8080)
            .with_metadata(LOCAL_INSTANCE_METADATA_KEY, "local-instance"),
    );
    let balancer = IsolationBalancer::new("orders", supplier);

    assert!(balancer.choose(&request_from("10.0.0.9")).await.is_none());
}

#[tokio::test]
async fn stats_reflect_local_and_random_selections() {
    let balancer = IsolationBalancer::new("orders", registry());

    balancer.choose(&request_from("127.0.0.1")).await.unwrap();
    balancer.choose(&request_from("10.0.0.99")).await.unwrap();
    balancer
        .choose(&RequestContext::default())
        .await
        .unwrap();

    let stats = balancer.stats();
    assert_eq!(stats.algorithm, "isolation");
    assert_eq!(stats.total_requests, 3);
    assert_eq!(stats.local_hits, 1);
    assert_eq!(stats.failed_selections, 0);
    assert!(!stats.instance_stats.is_empty());
}

#[test]
fn blocking_variant_prefers_live_instances() {
    let supplier = Arc::new(StaticInstanceSupplier::new());
    let dead = ServiceInstance::new("orders", "10.0.0.5", 8080);
    let dead_id = dead.id.clone();
    supplier.register(dead);
    supplier.register(ServiceInstance::new("orders", "10.0.0.6", 8080));
    supplier.set_liveness(&dead_id, false, false);

    let balancer = RetryingIsolationBalancer::with_random(
        "orders",
        supplier,
        Arc::new(CyclingRandom(AtomicUsize::new(0))),
    );

    for _ in 0..10 {
        let chosen = balancer.choose(&request_from("10.0.0.99")).unwrap();
        assert_eq!(chosen.host, "10.0.0.6");
    }
}

#[test]
fn blocking_variant_isolates_local_instances_too() {
    let supplier = Arc::new(StaticInstanceSupplier::new());
    supplier.register(
        ServiceInstance::new("orders", "127.0.0.1", 8080)
            .with_metadata(LOCAL_INSTANCE_METADATA_KEY, "local-instance"),
    );
    supplier.register(ServiceInstance::new("orders", "10.0.0.5", 8080));

    let balancer = RetryingIsolationBalancer::new("orders", supplier);

    let local = balancer.choose(&request_from("127.0.0.1")).unwrap();
    assert!(local.is_local());

    let foreign = balancer.choose(&request_from("10.0.0.9")).unwrap();
    assert_eq!(foreign.host, "10.0.0.5");
}
