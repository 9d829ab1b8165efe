//! Header manipulation for forwarded requests and relayed responses.
//!
//! - Strip hop-by-hop headers in both directions
//! - Point `Host` at the upstream
//! - Record the original host in `X-Forwarded-Host`
//! - Append the client address to `X-Forwarded-For`

use std::net::SocketAddr;

use axum::http::{
    header::{CONNECTION, HOST},
    HeaderMap, HeaderName, HeaderValue,
};

use crate::gateway::upstream::Upstream;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that only apply to a single connection.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in &listed {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// The host the caller addressed: the `Host` header, else the URI authority.
pub fn original_host(headers: &HeaderMap, authority: Option<&str>) -> Option<HeaderValue> {
    headers
        .get(HOST)
        .cloned()
        .or_else(|| authority.and_then(|a| HeaderValue::from_str(a).ok()))
}

/// Rewrite forwarding headers so the request targets `upstream`.
pub fn apply_forwarding_headers(
    headers: &mut HeaderMap,
    original_host: Option<HeaderValue>,
    client: Option<SocketAddr>,
    upstream: &Upstream,
) {
    match original_host {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST, host);
        }
        None => {
            headers.remove(X_FORWARDED_HOST);
        }
    }

    headers.insert(HOST, upstream.host_header().clone());

    if let Some(client) = client {
        let ip = client.ip().to_string();
        let prior: Vec<&str> = headers
            .get_all(&X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        let value = if prior.is_empty() {
            ip
        } else {
            format!("{}, {}", prior.join(", "), ip)
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}
