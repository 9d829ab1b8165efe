//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router with a catch-all route
//! - Wire up middleware (request id, tracing, body limit)
//! - Run each request through translation, then forwarding
//! - Map per-request failures to responses

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::HOST, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::gateway::{Forwarder, Upstream, UpstreamError};
use crate::http::request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
use crate::observability::metrics;
use crate::translate::translate;

/// Errors raised while assembling the server. All of them are fatal.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub forwarder: Forwarder,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    forwarder: Forwarder,
}

impl HttpServer {
    /// Create a server forwarding to `config.url`.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let upstream = Upstream::parse(&config.url)?;
        let forwarder = Forwarder::new(upstream)?;
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            forwarder: forwarder.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, forwarder })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.forwarder.upstream().url(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request.request_id(),
    )
}

/// Catch-all handler: translate, then forward.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
        "Proxying request"
    );

    let response = match handle(&state, request, client, &request_id).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                ProxyError::MalformedPayload(_)
                | ProxyError::BodyRead(_)
                | ProxyError::BodyTooLarge { .. } => {
                    tracing::warn!(request_id = %request_id, error = %e, "Rejecting request");
                }
                _ => {
                    tracing::error!(request_id = %request_id, error = %e, "Request failed");
                }
            }
            metrics::record_error(e.kind());
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn handle(
    state: &AppState,
    request: Request<Body>,
    client: Option<SocketAddr>,
    request_id: &str,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    // Read once; the translator borrows it and the forwarder gets whichever
    // body wins.
    let body = axum::body::to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|e| ProxyError::from_body_error(e, state.config.max_body_bytes))?;

    let translation =
        translate(&body).inspect_err(|_| metrics::record_translation("malformed"))?;
    metrics::record_translation(translation.outcome());

    if translation.is_rewrite() {
        let from = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        tracing::info!(request_id = %request_id, from = %from, "Converting request");
    } else {
        tracing::debug!(request_id = %request_id, "Passing request through unchanged");
    }

    let body = translation.into_body(body);
    state.forwarder.forward(&parts, client, body).await
}
