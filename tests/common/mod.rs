//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use grafana_apprise_proxy::{HttpServer, ProxyConfig, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request as the mock upstream received it.
#[derive(Debug)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Mock upstream that records every request and answers with a fixed reply.
pub struct MockUpstream {
    pub addr: SocketAddr,
    received: mpsc::UnboundedReceiver<Captured>,
}

impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Next captured request, failing the test if none arrives.
    pub async fn next(&mut self) -> Captured {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("upstream never received the request")
            .expect("mock upstream stopped")
    }

    /// Whether a request arrived without waiting for one.
    #[allow(dead_code)]
    pub fn try_next(&mut self) -> Option<Captured> {
        self.received.try_recv().ok()
    }
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_mock_upstream(status: StatusCode, reply: &'static str) -> MockUpstream {
    start_mock_upstream_with_headers(status, &[], reply).await
}

/// Start a mock upstream that also sends `headers` with every reply.
pub async fn start_mock_upstream_with_headers(
    status: StatusCode,
    headers: &'static [(&'static str, &'static str)],
    reply: &'static str,
) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, received) = mpsc::unbounded_channel();

    let app = Router::new().fallback(move |request: Request| {
        let tx = tx.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
            let _ = tx.send(Captured {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            });
            let mut response = (status, [("x-upstream", "mock")], reply).into_response();
            for &(name, value) in headers {
                response.headers_mut().append(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                );
            }
            response
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, received }
}

/// Signals that fire as a stalled upstream handler starts and is dropped.
#[allow(dead_code)]
pub struct StalledUpstream {
    pub addr: SocketAddr,
    pub started: mpsc::UnboundedReceiver<()>,
    pub dropped: mpsc::UnboundedReceiver<()>,
}

struct DropSignal(mpsc::UnboundedSender<()>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// Start an upstream whose handler never answers in time. The handler future
/// holds a guard that reports when it is dropped.
#[allow(dead_code)]
pub async fn start_stalled_upstream() -> StalledUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (started_tx, started) = mpsc::unbounded_channel();
    let (dropped_tx, dropped) = mpsc::unbounded_channel();

    let app = Router::new().fallback(move || {
        let started_tx = started_tx.clone();
        let guard = DropSignal(dropped_tx.clone());
        async move {
            let _guard = guard;
            let _ = started_tx.send(());
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StalledUpstream {
        addr,
        started,
        dropped,
    }
}

/// A running proxy. Stops when dropped.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the proxy on an ephemeral port, forwarding to `upstream_url`.
pub async fn start_proxy(upstream_url: String) -> TestProxy {
    let server = HttpServer::new(ProxyConfig::new(upstream_url)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

/// Client that never goes through a system proxy and never follows
/// redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
