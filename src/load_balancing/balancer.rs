//! # Isolation Balancer
//!
//! The core instance-selection algorithm. For each request:
//!
//! 1. **Local match pass**: look for an instance that carries the
//!    `local-instance-id` metadata tag AND whose host equals the request's
//!    resolved origin IP. A developer's own calls loop back to the instance
//!    they started; restricting the match to tagged instances keeps a
//!    production instance sharing the developer's host from hijacking the
//!    pass.
//! 2. **Random fallback pass**: drop every tagged instance from the pool
//!    (production traffic must never land on a local instance) and draw
//!    uniformly at random from the remainder.
//!
//! Absence is a first-class result: an empty pool yields `None`, never an
//! error, and the caller degrades the request to a no-server outcome.
//!
//! ## Rust Concepts Used
//!
//! - `Arc<dyn Trait>` for the injected supplier and random source
//! - `AtomicU64` counters and `DashMap` for lock-free selection stats
//! - `async_trait` for async methods in the balancer trait

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::types::{RequestContext, ServiceInstance};
use crate::discovery::supplier::InstanceSupplier;
use crate::origin::resolve_origin_ip;

/// Source of uniform random indices for the fallback pass
///
/// Injected rather than reached for globally so selection is deterministic
/// under test with a seeded substitute. Implementations must be safe for
/// concurrent use by many simultaneous selection calls.
pub trait RandomSource: Send + Sync {
    /// Uniform draw from `[0, bound)`. `bound` is never zero.
    fn index(&self, bound: usize) -> usize;
}

/// Production random source backed by the thread-local generator
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, bound: usize) -> usize {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// Deterministic random source for tests and reproduction runs
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index(&self, bound: usize) -> usize {
        self.rng.lock().gen_range(0..bound)
    }
}

/// Selection statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct SelectionStats {
    pub algorithm: String,
    pub total_requests: u64,
    pub local_hits: u64,
    pub failed_selections: u64,
    pub instance_stats: HashMap<String, InstanceStats>,
}

/// Per-instance statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstanceStats {
    pub selections: u64,
    pub last_selected: Option<chrono::DateTime<chrono::Utc>>,
}

/// Shared stats recorder used by both selector variants
pub(crate) struct StatsRecorder {
    total_requests: AtomicU64,
    local_hits: AtomicU64,
    failed_selections: AtomicU64,
    per_instance: DashMap<String, InstanceStats>,
}

impl StatsRecorder {
    pub(crate) fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            local_hits: AtomicU64::new(0),
            failed_selections: AtomicU64::new(0),
            per_instance: DashMap::new(),
        }
    }

    pub(crate) fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_selection(&self, instance: &ServiceInstance) {
        if instance.is_local() {
            self.local_hits.fetch_add(1, Ordering::Relaxed);
        }
        let mut stats = self
            .per_instance
            .entry(instance.id.clone())
            .or_insert_with(|| InstanceStats {
                selections: 0,
                last_selected: None,
            });
        stats.selections += 1;
        stats.last_selected = Some(chrono::Utc::now());
    }

    pub(crate) fn record_failure(&self) {
        self.failed_selections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, algorithm: &str) -> SelectionStats {
        let instance_stats = self
            .per_instance
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        SelectionStats {
            algorithm: algorithm.to_string(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            local_hits: self.local_hits.load(Ordering::Relaxed),
            failed_selections: self.failed_selections.load(Ordering::Relaxed),
            instance_stats,
        }
    }
}

/// First instance tagged as local whose host equals the request origin.
///
/// An empty origin matches nothing; resolution failures upstream degrade to
/// the random pass instead of aborting selection.
pub(crate) fn match_local_instance<'a>(
    instances: &'a [ServiceInstance],
    origin: &str,
) -> Option<&'a ServiceInstance> {
    if origin.is_empty() {
        return None;
    }
    instances
        .iter()
        .find(|instance| instance.is_local() && instance.host == origin)
}

/// Non-local instances of the pool
pub(crate) fn without_local_instances(instances: &[ServiceInstance]) -> Vec<&ServiceInstance> {
    instances
        .iter()
        .filter(|instance| !instance.is_local())
        .collect()
}

/// Run the two-pass isolation selection over an instance snapshot.
///
/// Returns `None` when the list is empty or when every instance carries the
/// local tag and none matched the origin.
pub fn pick_instance<'a>(
    service: &str,
    instances: &'a [ServiceInstance],
    origin: &str,
    random: &dyn RandomSource,
) -> Option<&'a ServiceInstance> {
    if instances.is_empty() {
        warn!(service = %service, "no servers available");
        counter!("isolation_lb_failed_selections").increment(1);
        return None;
    }

    if let Some(local) = match_local_instance(instances, origin) {
        info!(service = %service, instance_id = %local.id, "chose local server instance");
        counter!("isolation_lb_local_hits").increment(1);
        return Some(local);
    }

    let pool = without_local_instances(instances);
    if pool.is_empty() {
        warn!(service = %service, "no non-local servers available");
        counter!("isolation_lb_failed_selections").increment(1);
        return None;
    }

    let chosen = pool[random.index(pool.len())];
    debug!(
        service = %service,
        instance_id = %chosen.id,
        instance_address = %chosen.address(),
        "chose random server instance"
    );
    counter!("isolation_lb_selections").increment(1);
    Some(chosen)
}

/// Interface the load-balancer integration point calls once per request
#[async_trait]
pub trait LoadBalancer: Send + Sync {
    /// Select an instance for the request, or `None` when no server is
    /// available. Never returns an error: selection failures are absorbed
    /// and logged here so they cannot abort the request pipeline.
    async fn choose(&self, context: &RequestContext) -> Option<ServiceInstance>;

    /// Algorithm name for metrics and logging
    fn algorithm_name(&self) -> &'static str;

    /// Current selection statistics
    fn stats(&self) -> SelectionStats;
}

/// Isolation selector over an async instance-list supplier
///
/// Used in reactive call contexts where the registry already filters the
/// list to healthy instances upstream, so no liveness check happens here.
/// The supplier's fetch is awaited to a completed snapshot before the
/// matching logic runs; matching itself never suspends.
pub struct IsolationBalancer {
    service_id: String,
    supplier: Arc<dyn InstanceSupplier>,
    random: Arc<dyn RandomSource>,
    stats: StatsRecorder,
}

impl IsolationBalancer {
    /// Create a balancer for one logical service
    pub fn new(service_id: impl Into<String>, supplier: Arc<dyn InstanceSupplier>) -> Self {
        Self::with_random(service_id, supplier, Arc::new(ThreadRandom))
    }

    /// Create a balancer with an injected random source
    pub fn with_random(
        service_id: impl Into<String>,
        supplier: Arc<dyn InstanceSupplier>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            supplier,
            random,
            stats: StatsRecorder::new(),
        }
    }

    /// Logical service this balancer selects for
    pub fn service_id(&self) -> &str {
        &self.service_id
    }
}

#[async_trait]
impl LoadBalancer for IsolationBalancer {
    async fn choose(&self, context: &RequestContext) -> Option<ServiceInstance> {
        self.stats.record_request();

        let instances = match self.supplier.instances(&self.service_id).await {
            Ok(instances) => instances,
            Err(err) => {
                warn!(service = %self.service_id, error = %err, "failed to fetch instance list");
                counter!("isolation_lb_failed_selections").increment(1);
                self.stats.record_failure();
                return None;
            }
        };

        let origin = resolve_origin_ip(context);
        match pick_instance(&self.service_id, &instances, &origin, self.random.as_ref()) {
            Some(instance) => {
                self.stats.record_selection(instance);
                Some(instance.clone())
            }
            None => {
                self.stats.record_failure();
                None
            }
        }
    }

    fn algorithm_name(&self) -> &'static str {
        "isolation"
    }

    fn stats(&self) -> SelectionStats {
        self.stats.snapshot(self.algorithm_name())
    }
}
