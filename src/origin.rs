//! # Origin IP Resolution
//!
//! Reconstructs the best-effort client IP of a request from the chain of
//! reverse-proxy headers. Which header actually carries the value depends on
//! the nginx/gateway deployment in front of the service, so a fixed priority
//! list is walked and the first usable entry wins. Resolution never fails:
//! malformed or missing headers fall through to the next tier, and the
//! result may be the empty string.

use std::net::IpAddr;
use tracing::debug;

use crate::core::types::RequestContext;

/// Stamped by nginx with the real client address
pub const X_REAL_IP: &str = "x-real-ip";
/// Standard multi-hop forwarding chain, first entry is the client
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// Apache proxy convention (wire name `Proxy-Client-IP`)
pub const PROXY_CLIENT_IP: &str = "proxy-client-ip";
/// WebLogic proxy convention (wire name `WL-Proxy-Client-IP`)
pub const WL_PROXY_CLIENT_IP: &str = "wl-proxy-client-ip";
/// Internal header stamped by the gateway's client-IP filter when the
/// gateway itself is the entry point (wire name `X_CLIENT_IP`)
pub const X_CLIENT_IP: &str = "x_client_ip";

/// Placeholder some proxies insert for an address they could not determine
const UNKNOWN: &str = "unknown";
const IP_SEPARATOR: char = ',';

/// Header tiers in resolution priority order
const HEADER_PRIORITY: [&str; 5] = [
    X_REAL_IP,
    X_FORWARDED_FOR,
    PROXY_CLIENT_IP,
    WL_PROXY_CLIENT_IP,
    X_CLIENT_IP,
];

/// Request-scoped header lookup plus the raw peer address fallback
///
/// Abstracts over the caller's request representation so both the reactive
/// and blocking selectors feed the same resolver.
pub trait HeaderSource {
    /// Get a header value by name
    fn header(&self, name: &str) -> Option<&str>;

    /// Raw remote address of the connection, if the transport exposes one.
    /// This is the immediate proxy hop, not the true client, and is only
    /// used when every header tier misses.
    fn remote_addr(&self) -> Option<IpAddr>;
}

impl HeaderSource for RequestContext {
    fn header(&self, name: &str) -> Option<&str> {
        RequestContext::header(self, name)
    }

    fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr.map(|addr| addr.ip())
    }
}

/// Resolve the origin client IP for a request.
///
/// Walks the proxy header chain in priority order and returns the first
/// value that is non-blank and not the `unknown` placeholder, falling back
/// to the raw peer address as a last resort. Multi-hop `a, b, c` lists are
/// reduced to their first entry. Returns an empty string when nothing is
/// available.
pub fn resolve_origin_ip(source: &dyn HeaderSource) -> String {
    let raw = HEADER_PRIORITY
        .into_iter()
        .find_map(|name| {
            source
                .header(name)
                .map(str::trim)
                .filter(|value| is_present(value))
                .map(str::to_owned)
        })
        .or_else(|| source.remote_addr().map(|addr| addr.to_string()))
        .unwrap_or_default();

    let ip = first_hop(&raw).to_string();
    debug!(origin_ip = %ip, "resolved request origin");
    ip
}

fn is_present(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case(UNKNOWN)
}

/// First entry of a comma-separated forwarding chain
fn first_hop(value: &str) -> &str {
    value.split(IP_SEPARATOR).next().unwrap_or(value).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn context(pairs: &[(&str, &str)]) -> RequestContext {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        RequestContext::new(headers, None)
    }

    #[test]
    fn test_priority_order() {
        let ctx = context(&[
            (X_FORWARDED_FOR, "10.0.0.2"),
            (X_REAL_IP, "10.0.0.1"),
        ]);
        assert_eq!(resolve_origin_ip(&ctx), "10.0.0.1");
    }

    #[test]
    fn test_unknown_is_treated_as_absent() {
        let ctx = context(&[
            (X_FORWARDED_FOR, "unknown"),
            (PROXY_CLIENT_IP, "192.168.1.5"),
        ]);
        assert_eq!(resolve_origin_ip(&ctx), "192.168.1.5");

        let ctx = context(&[(X_REAL_IP, "UNKNOWN"), (WL_PROXY_CLIENT_IP, "10.1.1.1")]);
        assert_eq!(resolve_origin_ip(&ctx), "10.1.1.1");
    }

    #[test]
    fn test_blank_falls_through() {
        let ctx = context(&[(X_REAL_IP, " "), (X_FORWARDED_FOR, "10.0.0.7")]);
        assert_eq!(resolve_origin_ip(&ctx), "10.0.0.7");
    }

    #[test]
    fn test_multi_hop_keeps_first_entry() {
        let ctx = context(&[(X_FORWARDED_FOR, "10.0.0.1,10.0.0.2")]);
        assert_eq!(resolve_origin_ip(&ctx), "10.0.0.1");

        let ctx = context(&[(X_FORWARDED_FOR, "10.0.0.1, 10.0.0.2, 10.0.0.3")]);
        assert_eq!(resolve_origin_ip(&ctx), "10.0.0.1");
    }

    #[test]
    fn test_gateway_stamped_header() {
        let ctx = context(&[(X_CLIENT_IP, "172.16.0.9")]);
        assert_eq!(resolve_origin_ip(&ctx), "172.16.0.9");
    }

    #[test]
    fn test_remote_addr_last_resort() {
        let ctx = RequestContext::new(HeaderMap::new(), Some("10.0.0.4:51234".parse().unwrap()));
        assert_eq!(resolve_origin_ip(&ctx), "10.0.0.4");
    }

    #[test]
    fn test_nothing_available_resolves_empty() {
        let ctx = RequestContext::default();
        assert_eq!(resolve_origin_ip(&ctx), "");
    }
}
