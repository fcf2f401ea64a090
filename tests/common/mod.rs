//! Shared utilities for the integration and load tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::IntoResponse;
use axum::Router;
use dashboard_proxy::config::ProxyConfig;
use dashboard_proxy::http::HttpServer;
use dashboard_proxy::lifecycle::Shutdown;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Counts requests that reached a backend.
#[derive(Debug, Clone, Default)]
pub struct HitCounter(Arc<AtomicU32>);

impl HitCounter {
    pub fn hit(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    pub fn count(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Start a backend that answers every request with a JSON description of
/// what it received. Extra response headers let tests check filtering.
pub async fn start_echo_backend(hits: HitCounter) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
        let hits = hits.clone();
        async move {
            hits.hit();
            let mut received = Map::new();
            for (name, value) in headers.iter() {
                received.insert(
                    name.as_str().to_string(),
                    Value::String(value.to_str().unwrap_or_default().to_string()),
                );
            }
            let echo = json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query(),
                "headers": received,
                "body": String::from_utf8_lossy(&body),
            });
            (
                [
                    ("content-type", "application/json"),
                    ("cache-control", "max-age=60"),
                    ("set-cookie", "session=abc"),
                    ("x-backend", "echo"),
                ],
                echo.to_string(),
            )
                .into_response()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// What a programmable backend does with one connection.
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond {
        status: u16,
        content_type: &'static str,
        body: String,
    },
    /// Close the socket without answering.
    Drop,
    /// Hold the connection open without answering.
    Stall(Duration),
}

impl Behavior {
    pub fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Behavior::Respond {
            status: 200,
            content_type,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Behavior::Respond {
            status,
            content_type: "text/plain",
            body: body.into(),
        }
    }
}

/// Start a raw TCP backend; `f` receives the 0-based connection index.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Behavior> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);
    let connections = HitCounter::default();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let index = connections.hit();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        match f(index).await {
                            Behavior::Respond {
                                status,
                                content_type,
                                body,
                            } => {
                                let reason = match status {
                                    200 => "OK",
                                    404 => "Not Found",
                                    429 => "Too Many Requests",
                                    500 => "Internal Server Error",
                                    502 => "Bad Gateway",
                                    503 => "Service Unavailable",
                                    _ => "Unknown",
                                };
                                let response = format!(
                                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                    status,
                                    reason,
                                    content_type,
                                    body.len(),
                                    body
                                );
                                let _ = socket.write_all(response.as_bytes()).await;
                                let _ = socket.shutdown().await;
                            }
                            Behavior::Drop => drop(socket),
                            Behavior::Stall(duration) => {
                                tokio::time::sleep(duration).await;
                                drop(socket);
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Run the proxy on an ephemeral port.
pub async fn spawn_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        // keep the sender alive so the reload task idles instead of exiting
        let _updates = updates;
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Default test config with quick retries.
pub fn fast_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config
}

pub fn proxy_url(proxy: SocketAddr, path: &str) -> String {
    format!("http://{}/api/proxy/{}", proxy, path.trim_start_matches('/'))
}
