//! # Isolation Load Balancer
//!
//! Client-side load balancing with local-instance traffic isolation.
//!
//! A developer can register a locally-running service instance into the same
//! registry namespace as production instances without that instance ever
//! receiving production traffic. Instances started locally carry the
//! `local-instance-id` metadata tag; for each request the balancer first
//! looks for a tagged instance whose host equals the request's resolved
//! origin IP (so the developer's own calls loop back to their instance), and
//! otherwise draws uniformly at random from the non-local pool.
//!
//! Two selector variants share the same matching core:
//! - [`IsolationBalancer`] consumes an async instance-list supplier and is
//!   meant for reactive call sites where the registry pre-filters health.
//! - [`RetryingIsolationBalancer`] works against a synchronous snapshot and
//!   additionally retries the random draw against per-instance liveness.

/// Core functionality: error types, configuration, and instance/request types
pub mod core;

/// Origin IP resolution from the proxy header chain
pub mod origin;

/// Selection algorithms: the isolation balancer and its liveness-retrying variant
pub mod load_balancing;

/// Instance-list providers and the registration-side metadata contract
pub mod discovery;

/// HTTP middleware: the gateway filter stamping the internal client-IP header
pub mod middleware;

/// Logging setup
pub mod observability;

// Re-export the types most integrations need so they can be imported from
// the crate root.

pub use crate::core::config::IsolationConfig;
pub use crate::core::error::{IsolationError, IsolationResult};
pub use crate::core::types::{RequestContext, ServiceInstance, LOCAL_INSTANCE_METADATA_KEY};

pub use crate::discovery::{
    apply_local_tag, InstanceSupplier, StaticInstanceSupplier, SyncInstanceSupplier,
};
pub use crate::load_balancing::{
    IsolationBalancer, LoadBalancer, RandomSource, RetryingIsolationBalancer, SeededRandom,
    SelectionStats, ThreadRandom,
};
pub use crate::origin::{resolve_origin_ip, HeaderSource};
