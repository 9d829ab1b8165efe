//! Upstream forwarding.
//!
//! Sends the finalized request to the upstream and turns the upstream's
//! answer into a response for the caller. The response body is streamed,
//! not buffered.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_LENGTH, request::Parts, HeaderValue},
    response::Response,
};
use reqwest::redirect::Policy;

use crate::error::ProxyError;
use crate::gateway::headers::{apply_forwarding_headers, original_host, strip_hop_by_hop};
use crate::gateway::upstream::Upstream;

/// Forwards requests to the configured upstream.
///
/// Cheap to clone: the HTTP client pools connections internally.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    upstream: Arc<Upstream>,
}

impl Forwarder {
    pub fn new(upstream: Upstream) -> Result<Self, reqwest::Error> {
        // Upstream redirects go back to the caller untouched.
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            upstream: Arc::new(upstream),
        })
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Send `body` upstream using the method, URI and headers of `parts`.
    ///
    /// Dropping the returned future abandons the upstream call.
    pub async fn forward(
        &self,
        parts: &Parts,
        client: Option<SocketAddr>,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        let target = self
            .upstream
            .target_for(&parts.uri)
            .map_err(ProxyError::InvalidTarget)?;

        let mut headers = parts.headers.clone();
        let host = original_host(&parts.headers, parts.uri.authority().map(|a| a.as_str()));
        strip_hop_by_hop(&mut headers);
        apply_forwarding_headers(&mut headers, host, client, &self.upstream);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));

        tracing::debug!(target_url = %target, bytes = body.len(), "Forwarding upstream");

        let response = self
            .client
            .request(parts.method.clone(), target)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(ProxyError::UpstreamUnreachable)?;

        Ok(relay(response))
    }
}

/// Copy status, headers and body of an upstream response.
fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
