//! End-to-end tests: caller → proxy → mock upstream.

use std::time::Duration;

use axum::http::StatusCode;

mod common;

const REWRITTEN_ALERT: &str =
    r#"{"urls":"","body":"CPU at 95%","title":"CPU High","type":"failure"}"#;

#[tokio::test]
async fn dashboard_alert_is_rewritten() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "queued").await;
    let proxy = common::start_proxy(upstream.url("/notify/apprise")).await;

    let res = common::client()
        .post(proxy.url("/"))
        .header("content-type", "application/json")
        .body(r#"{"dashboardId":5,"state":"alerting","title":"CPU High","message":"CPU at 95%"}"#)
        .send()
        .await
        .expect("proxy unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "queued");

    let captured = upstream.next().await;
    assert_eq!(captured.body, REWRITTEN_ALERT.as_bytes());
    assert_eq!(
        captured.headers.get("content-length").unwrap(),
        &REWRITTEN_ALERT.len().to_string()
    );
    assert_eq!(captured.headers.get("content-type").unwrap(), "application/json");
    assert_eq!(captured.uri.path(), "/notify/apprise/");
}

#[tokio::test]
async fn recovered_alert_maps_to_success() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "").await;
    let proxy = common::start_proxy(upstream.url("")).await;

    common::client()
        .post(proxy.url("/notify"))
        .body(r#"{"dashboardId":5,"state":"ok","title":"Recovered","message":"back to normal"}"#)
        .send()
        .await
        .unwrap();

    let captured = upstream.next().await;
    let json: serde_json::Value = serde_json::from_slice(&captured.body).unwrap();
    assert_eq!(json["type"], "success");
    assert_eq!(json["title"], "Recovered");
    assert_eq!(json["body"], "back to normal");
    assert_eq!(json["urls"], "");
}

#[tokio::test]
async fn unknown_state_maps_to_info() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "").await;
    let proxy = common::start_proxy(upstream.url("")).await;

    common::client()
        .post(proxy.url("/"))
        .body(r#"{"dashboardId":1,"state":"mystery-state","message":"x","title":"y"}"#)
        .send()
        .await
        .unwrap();

    let captured = upstream.next().await;
    assert_eq!(
        captured.body,
        r#"{"urls":"","body":"x","title":"y","type":"info"}"#.as_bytes()
    );
}

#[tokio::test]
async fn payload_without_dashboard_is_forwarded_verbatim() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "").await;
    let proxy = common::start_proxy(upstream.url("")).await;

    // Odd spacing and key order must survive untouched.
    let original = "{ \"state\" : \"alerting\",\n  \"message\":\"no dashboard id here\" }";
    common::client()
        .post(proxy.url("/notify?tag=ops"))
        .body(original)
        .send()
        .await
        .unwrap();

    let captured = upstream.next().await;
    assert_eq!(captured.body, original.as_bytes());
    assert_eq!(
        captured.headers.get("content-length").unwrap(),
        &original.len().to_string()
    );
    assert_eq!(captured.uri.path(), "/notify");
    assert_eq!(captured.uri.query(), Some("tag=ops"));
}

#[tokio::test]
async fn upstream_response_is_relayed() {
    let mut upstream = common::start_mock_upstream(StatusCode::IM_A_TEAPOT, "short and stout").await;
    let proxy = common::start_proxy(upstream.url("")).await;

    let res = common::client()
        .put(proxy.url("/anything"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(res.headers().get("x-upstream").unwrap(), "mock");
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "short and stout");

    let captured = upstream.next().await;
    assert_eq!(captured.method, "PUT");
}

#[tokio::test]
async fn forwarding_headers_target_upstream() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "").await;
    let proxy = common::start_proxy(upstream.url("")).await;

    common::client()
        .post(proxy.url("/"))
        .header("x-request-id", "grafana-req-1")
        .body(r#"{"dashboardId":3}"#)
        .send()
        .await
        .unwrap();

    let captured = upstream.next().await;
    assert_eq!(
        captured.headers.get("host").unwrap(),
        &upstream.addr.to_string()
    );
    assert_eq!(
        captured.headers.get("x-forwarded-host").unwrap(),
        &proxy.addr.to_string()
    );
    assert_eq!(captured.headers.get("x-forwarded-for").unwrap(), "127.0.0.1");
    assert_eq!(captured.headers.get("x-request-id").unwrap(), "grafana-req-1");
}

#[tokio::test]
async fn malformed_payload_is_rejected_without_forwarding() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "").await;
    let proxy = common::start_proxy(upstream.url("")).await;

    let res = common::client()
        .post(proxy.url("/"))
        .body("this is not json")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.text().await.unwrap().contains("malformed alert payload"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(upstream.try_next().is_none());

    // The proxy keeps serving after a bad request.
    let res = common::client()
        .post(proxy.url("/"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let dead = common::closed_addr().await;
    let proxy = common::start_proxy(format!("http://{}", dead)).await;

    let res = common::client()
        .post(proxy.url("/"))
        .body(r#"{"dashboardId":1,"state":"ok"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let mut upstream = common::start_mock_upstream(StatusCode::OK, "").await;
    let proxy = common::start_proxy(upstream.url("")).await;
    let client = common::client();

    let alert = r#"{"dashboardId":5,"state":"alerting","title":"CPU High","message":"CPU at 95%"}"#;
    let plain = r#"{"state":"alerting","message":"plain"}"#;

    let (a, b) = tokio::join!(
        client.post(proxy.url("/alert")).body(alert).send(),
        client.post(proxy.url("/plain")).body(plain).send(),
    );
    assert_eq!(a.unwrap().status(), StatusCode::OK);
    assert_eq!(b.unwrap().status(), StatusCode::OK);

    let first = upstream.next().await;
    let second = upstream.next().await;
    for captured in [first, second] {
        match captured.uri.path() {
            "/alert" => assert_eq!(captured.body, REWRITTEN_ALERT.as_bytes()),
            "/plain" => assert_eq!(captured.body, plain.as_bytes()),
            other => panic!("unexpected path {other}"),
        }
    }
}

#[tokio::test]
async fn upstream_redirect_is_relayed_not_followed() {
    let mut upstream = common::start_mock_upstream_with_headers(
        StatusCode::FOUND,
        &[
            ("location", "/elsewhere"),
            ("keep-alive", "timeout=5"),
            ("connection", "x-upstream-hop"),
            ("x-upstream-hop", "1"),
        ],
        "",
    )
    .await;
    let proxy = common::start_proxy(upstream.url("")).await;

    let res = common::client()
        .post(proxy.url("/notify"))
        .body(r#"{"dashboardId":5,"state":"ok"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers().get("location").unwrap(), "/elsewhere");
    assert!(res.headers().get("keep-alive").is_none());
    assert!(res.headers().get("x-upstream-hop").is_none());
    assert_eq!(res.headers().get("x-upstream").unwrap(), "mock");

    let captured = upstream.next().await;
    assert_eq!(captured.uri.path(), "/notify");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(upstream.try_next().is_none());
}

#[tokio::test]
async fn caller_disconnect_cancels_upstream_call() {
    let mut upstream = common::start_stalled_upstream().await;
    let proxy = common::start_proxy(format!("http://{}", upstream.addr)).await;

    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();

    let result = client
        .post(proxy.url("/"))
        .body(r#"{"dashboardId":5,"state":"alerting"}"#)
        .send()
        .await;
    assert!(result.unwrap_err().is_timeout());

    tokio::time::timeout(Duration::from_secs(5), upstream.started.recv())
        .await
        .expect("upstream never saw the request");
    tokio::time::timeout(Duration::from_secs(5), upstream.dropped.recv())
        .await
        .expect("upstream handler was not cancelled");
}
