//! Failure injection tests for the relay loop.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::Value;

mod common;

use common::{client, closed_port, fast_config, proxy_url, spawn_proxy, start_programmable_backend, Behavior, HitCounter};

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let hits = HitCounter::default();
    let h = hits.clone();
    let backend = start_programmable_backend(move |_| {
        h.hit();
        async move { Behavior::status(404, "no such page") }
    })
    .await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "v1/pages/42"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Proxy request failed");
    assert_eq!(body["details"], "HTTP 404: no such page");
    assert_eq!(body["attempts"], 1);
    assert_eq!(body["url"], format!("http://{}/v1/pages/42", backend));
    assert_eq!(hits.count(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_service_unavailable_is_final() {
    let hits = HitCounter::default();
    let h = hits.clone();
    let backend = start_programmable_backend(move |_| {
        h.hit();
        async move { Behavior::status(503, "maintenance") }
    })
    .await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "status"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["details"].as_str().unwrap().starts_with("HTTP 503"));
    assert_eq!(hits.count(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_dropped_connection_is_retried() {
    let hits = HitCounter::default();
    let h = hits.clone();
    let backend = start_programmable_backend(move |index| {
        h.hit();
        async move {
            if index == 0 {
                Behavior::Drop
            } else {
                Behavior::ok("application/json", r#"{"ok":true}"#)
            }
        }
    })
    .await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "v1/health"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);
    assert_eq!(hits.count(), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_stalled_target_times_out_every_attempt() {
    let hits = HitCounter::default();
    let h = hits.clone();
    let backend = start_programmable_backend(move |_| {
        h.hit();
        async move { Behavior::Stall(Duration::from_secs(10)) }
    })
    .await;
    let mut config = fast_config();
    config.timeouts.attempt_ms = 200;
    let (proxy, shutdown) = spawn_proxy(config).await;

    let start = Instant::now();
    let res = client()
        .get(proxy_url(proxy, "slow"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["attempts"], 3);
    assert!(body["details"].as_str().unwrap().contains("timed out"));
    assert_eq!(hits.count(), 3);
    // three deadlines, well under the stall
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed < Duration::from_secs(5));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_target_uses_default_backoff() {
    let target = closed_port().await;
    let (proxy, shutdown) = spawn_proxy(dashboard_proxy::ProxyConfig::default()).await;

    let start = Instant::now();
    let res = client()
        .get(proxy_url(proxy, "v1/feed"))
        .header("X-Proxy-Target", format!("http://{}/", target))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["attempts"], 3);
    assert!(body["details"].as_str().unwrap().starts_with("Connection failure"));
    // 1s after the first failure, 2s after the second
    assert!(start.elapsed() >= Duration::from_secs(3));

    shutdown.trigger();
}
