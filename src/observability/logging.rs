//! # Structured Logging
//!
//! Tracing-subscriber setup for applications embedding the balancer. The
//! selection hot path only emits `tracing` events and `metrics` counters;
//! installing a subscriber (and exporter) is the embedding application's
//! call, and this helper covers the common case.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::error::{IsolationError, IsolationResult};

/// Install a global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the given default level. Set `json`
/// for machine-readable output in containerized deployments.
pub fn init_logging(default_level: &str, json: bool) -> IsolationResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| IsolationError::config(format!("Invalid log level: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    result.map_err(|e| IsolationError::config(format!("Failed to install subscriber: {}", e)))
}
