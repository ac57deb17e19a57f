//! # Client IP Middleware
//!
//! When the gateway itself is the entry point there may be no reverse proxy
//! in front of it to stamp `x-real-ip`/`x-forwarded-for`, so origin
//! resolution would come up empty. This middleware records the connection's
//! peer IP in the internal `X_CLIENT_IP` header, giving the resolver a
//! consistent final header tier. Any inbound value is overwritten: the
//! header is only trustworthy because clients cannot inject it.

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use tracing::debug;

use crate::origin::X_CLIENT_IP;

/// Stamp the peer IP of the connection into the internal client-IP header.
///
/// Wire in with `axum::middleware::from_fn(stamp_client_ip)` on routes that
/// forward to isolation-balanced services. The header value is empty when
/// the transport exposes no peer address.
pub async fn stamp_client_ip(mut request: Request, next: Next) -> Response {
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    debug!(client_ip = %client_ip, "stamping client ip header");

    let value = HeaderValue::from_str(&client_ip).unwrap_or_else(|_| HeaderValue::from_static(""));
    request.headers_mut().insert(X_CLIENT_IP, value);

    next.run(request).await
}
