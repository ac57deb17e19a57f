//! # Core Types Module
//!
//! Foundational data structures shared by the resolver, the selectors, and
//! the discovery surface: the registry-owned [`ServiceInstance`] snapshot and
//! the per-request [`RequestContext`].

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Metadata key marking an instance as started locally by a developer.
///
/// The registration side stamps this key exactly once, at instance startup;
/// production instances never carry it. Its presence is what matters to
/// selection; the value is the configured local instance id and is never
/// consulted by matching.
pub const LOCAL_INSTANCE_METADATA_KEY: &str = "local-instance-id";

/// One registered service endpoint as reported by the instance-list provider
///
/// Instances are immutable per-request snapshots owned by the external
/// registry; the selectors only ever read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Unique instance identifier
    pub id: String,

    /// Logical service name the instance is registered under
    pub service: String,

    /// Network address or hostname
    pub host: String,

    /// Port the instance serves on
    pub port: u16,

    /// Registry metadata attached to the instance
    pub metadata: HashMap<String, String>,

    /// Whether the registry currently reports the instance as alive
    pub alive: bool,

    /// Whether the instance reports itself ready to take traffic
    pub ready_to_serve: bool,
}

impl ServiceInstance {
    /// Create a new instance snapshot with empty metadata, reported live
    pub fn new(
        service: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        let service = service.into();
        let host = host.into();
        Self {
            id: format!("{}:{}:{}", service, host, port),
            service,
            host,
            port,
            metadata: HashMap::new(),
            alive: true,
            ready_to_serve: true,
        }
    }

    /// Attach a metadata entry, builder-style
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether this instance carries the local-instance tag
    pub fn is_local(&self) -> bool {
        self.metadata.contains_key(LOCAL_INSTANCE_METADATA_KEY)
    }

    /// `host:port` address string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Request-scoped inputs to selection: the inbound header map and, when the
/// transport exposes one, the raw peer address of the connection.
///
/// The peer address reflects the immediate proxy hop, not the true client,
/// so origin resolution only falls back to it as a last resort.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Inbound request headers
    pub headers: HeaderMap,

    /// Raw remote address of the connection, if known
    pub remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    /// Create a context from a header map and an optional peer address
    pub fn new(headers: HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            headers,
            remote_addr,
        }
    }

    /// Get a header value by name, ignoring values that are not valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
