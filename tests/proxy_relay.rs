//! End-to-end relay behaviour against a local echo backend.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use dashboard_proxy::config::AuthProviderConfig;
use serde_json::{json, Value};

mod common;

use common::{client, fast_config, proxy_url, spawn_proxy, start_echo_backend, start_programmable_backend, Behavior, HitCounter};

#[tokio::test]
async fn test_missing_target_header() {
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client().get(proxy_url(proxy, "v1/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().get("access-control-allow-origin").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Missing X-Proxy-Target header" }));

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_target_header() {
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "x"))
        .header("X-Proxy-Target", "not a url")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid proxy target URL");

    shutdown.trigger();
}

#[tokio::test]
async fn test_preflight_never_reaches_target() {
    let hits = HitCounter::default();
    let backend = start_echo_backend(hits.clone()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .request(reqwest::Method::OPTIONS, proxy_url(proxy, "v1/pages"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["access-control-allow-methods"], "GET, POST, PUT, DELETE, OPTIONS");
    assert_eq!(hits.count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_path_and_query_are_joined_onto_base() {
    let hits = HitCounter::default();
    let backend = start_echo_backend(hits.clone()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "users/me"))
        .query(&[("tag", "a"), ("tag", "b"), ("page", "2")])
        .header("X-Proxy-Target", format!("http://{}/v1/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/v1/users/me");
    assert_eq!(echo["query"], "tag=a&tag=b&page=2");
    assert_eq!(hits.count(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_base_without_trailing_slash_replaces_last_segment() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "items"))
        .header("X-Proxy-Target", format!("http://{}/v1/feed", backend))
        .send()
        .await
        .unwrap();

    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["path"], "/v1/items");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_host_gets_both_default_auth_headers() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "data"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .header("X-Proxy-API-Key", "k-123")
        .send()
        .await
        .unwrap();

    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["headers"]["authorization"], "Bearer k-123");
    assert_eq!(echo["headers"]["x-api-key"], "k-123");

    shutdown.trigger();
}

#[tokio::test]
async fn test_configured_provider_wins_over_default() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let mut config = fast_config();
    config.auth.providers.push(AuthProviderConfig {
        name: "local".into(),
        host_contains: "127.0.0.1".into(),
        headers: BTreeMap::from([("x-local-token".to_string(), "tok {key}".to_string())]),
    });
    let (proxy, shutdown) = spawn_proxy(config).await;

    let res = client()
        .get(proxy_url(proxy, "data"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .header("X-Proxy-API-Key", "abc")
        .send()
        .await
        .unwrap();

    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["headers"]["x-local-token"], "tok abc");
    assert!(echo["headers"].get("x-api-key").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_only_allow_listed_headers_reach_target() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "data"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .header("User-Agent", "dashboard-widget/2")
        .header("Accept", "application/json")
        .header("Cookie", "session=secret")
        .header("X-Request-Id", "from-caller")
        .header("X-Custom", "nope")
        .send()
        .await
        .unwrap();

    let echo: Value = res.json().await.unwrap();
    let headers = &echo["headers"];
    assert_eq!(headers["user-agent"], "dashboard-widget/2");
    assert_eq!(headers["accept"], "application/json");
    for dropped in ["cookie", "x-request-id", "x-custom", "x-proxy-target", "x-proxy-api-key"] {
        assert!(headers.get(dropped).is_none(), "{} should not be forwarded", dropped);
    }
    // no key supplied, nothing injected
    assert!(headers.get("authorization").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_json_body_is_forwarded() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let payload = json!({ "title": "Standup", "tags": ["daily", "team"], "done": false });
    let res = client()
        .post(proxy_url(proxy, "v1/pages"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["headers"]["content-type"], "application/json");
    let received: Value = serde_json::from_str(echo["body"].as_str().unwrap()).unwrap();
    assert_eq!(received, payload);

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_json_is_rejected_before_relay() {
    let hits = HitCounter::default();
    let backend = start_echo_backend(hits.clone()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .post(proxy_url(proxy, "v1/pages"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .header("Content-Type", "application/json")
        .body("{\"title\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Proxy request failed");
    assert_eq!(hits.count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_plain_body_passes_through() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .put(proxy_url(proxy, "notes/1"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .header("Content-Type", "text/plain")
        .body("remember {the milk")
        .send()
        .await
        .unwrap();

    let echo: Value = res.json().await.unwrap();
    assert_eq!(echo["method"], "PUT");
    assert_eq!(echo["body"], "remember {the milk");

    shutdown.trigger();
}

#[tokio::test]
async fn test_response_headers_are_filtered_and_cors_added() {
    let backend = start_echo_backend(HitCounter::default()).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .delete(proxy_url(proxy, "v1/blocks/9"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["cache-control"], "max-age=60");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("access-control-allow-methods"));
    assert!(headers.contains_key("access-control-allow-headers"));
    assert!(headers.get("set-cookie").is_none());
    assert!(headers.get("x-backend").is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_json_response_is_relayed_verbatim() {
    let feed = "<rss><channel><title>News</title></channel></rss>";
    let backend = start_programmable_backend(move |_| async move { Behavior::ok("application/rss+xml", feed) }).await;
    let (proxy, shutdown) = spawn_proxy(fast_config()).await;

    let res = client()
        .get(proxy_url(proxy, "feed.xml"))
        .header("X-Proxy-Target", format!("http://{}/", backend))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/rss+xml");
    assert_eq!(res.text().await.unwrap(), feed);

    shutdown.trigger();
}
