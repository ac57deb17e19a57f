//! # Liveness-Retrying Selector
//!
//! Selector variant for blocking call contexts, where the instance list is a
//! raw registry snapshot and the balancer itself must confirm an instance is
//! currently serving. The local-match pass is identical to the reactive
//! variant; the random fallback becomes a bounded redraw loop against the
//! per-instance liveness flags.
//!
//! The loop never sleeps: between draws it only yields the current thread as
//! a cooperative scheduling hint, so request latency characteristics stay
//! flat. After the attempt budget is spent, the last-drawn instance is
//! returned anyway, since a possibly-unready server beats failing the request
//! outright, and retry/circuit-breaking above this layer handles the rest.

use metrics::counter;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use crate::core::types::{RequestContext, ServiceInstance};
use crate::discovery::supplier::SyncInstanceSupplier;
use crate::load_balancing::balancer::{
    match_local_instance, without_local_instances, RandomSource, SelectionStats, StatsRecorder,
    ThreadRandom,
};
use crate::origin::resolve_origin_ip;

/// Maximum random draws against the liveness check before giving up
pub const RETRY_MAX: usize = 10;

/// Isolation selector with liveness retries over a synchronous snapshot
pub struct RetryingIsolationBalancer {
    service_id: String,
    supplier: Arc<dyn SyncInstanceSupplier>,
    random: Arc<dyn RandomSource>,
    stats: StatsRecorder,
}

impl RetryingIsolationBalancer {
    /// Create a balancer for one logical service
    pub fn new(service_id: impl Into<String>, supplier: Arc<dyn SyncInstanceSupplier>) -> Self {
        Self::with_random(service_id, supplier, Arc::new(ThreadRandom))
    }

    /// Create a balancer with an injected random source
    pub fn with_random(
        service_id: impl Into<String>,
        supplier: Arc<dyn SyncInstanceSupplier>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            supplier,
            random,
            stats: StatsRecorder::new(),
        }
    }

    /// Select an instance for the request, or `None` when no server is
    /// available. Blocking counterpart of [`LoadBalancer::choose`]; never
    /// returns an error.
    ///
    /// [`LoadBalancer::choose`]: crate::load_balancing::LoadBalancer::choose
    pub fn choose(&self, context: &RequestContext) -> Option<ServiceInstance> {
        self.stats.record_request();

        let instances = self.supplier.snapshot(&self.service_id);
        if instances.is_empty() {
            warn!(service = %self.service_id, "no servers available");
            counter!("isolation_lb_failed_selections").increment(1);
            self.stats.record_failure();
            return None;
        }

        let origin = resolve_origin_ip(context);
        if let Some(local) = match_local_instance(&instances, &origin) {
            info!(service = %self.service_id, instance_id = %local.id, "chose local server instance");
            counter!("isolation_lb_local_hits").increment(1);
            self.stats.record_selection(local);
            return Some(local.clone());
        }

        match self.retry_random(&instances) {
            Some(instance) => {
                counter!("isolation_lb_selections").increment(1);
                self.stats.record_selection(instance);
                Some(instance.clone())
            }
            None => {
                self.stats.record_failure();
                None
            }
        }
    }

    /// Random draw over the non-local pool, redrawn against liveness.
    ///
    /// Singleton pools are returned directly: redrawing a one-element pool
    /// can only yield the same instance.
    fn retry_random<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        let pool = without_local_instances(instances);
        if pool.is_empty() {
            warn!(service = %self.service_id, "no non-local servers available");
            counter!("isolation_lb_failed_selections").increment(1);
            return None;
        }
        if pool.len() == 1 {
            return Some(pool[0]);
        }

        let mut last_drawn = None;
        for _ in 0..RETRY_MAX {
            let candidate = pool[self.random.index(pool.len())];
            if candidate.alive && candidate.ready_to_serve {
                debug!(
                    service = %self.service_id,
                    instance_id = %candidate.id,
                    instance_address = %candidate.address(),
                    "chose random server instance"
                );
                return Some(candidate);
            }
            last_drawn = Some(candidate);
            thread::yield_now();
        }

        counter!("isolation_lb_retry_exhausted").increment(1);
        warn!(
            service = %self.service_id,
            attempts = RETRY_MAX,
            "no live server after retry budget, returning last draw"
        );
        last_drawn
    }

    /// Algorithm name for metrics and logging
    pub fn algorithm_name(&self) -> &'static str {
        "isolation_retry"
    }

    /// Current selection statistics
    pub fn stats(&self) -> SelectionStats {
        self.stats.snapshot(self.algorithm_name())
    }
}
