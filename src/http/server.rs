//! HTTP server setup and the proxy endpoint.
//!
//! # Responsibilities
//! - Create the Axum Router mounted under the proxy prefix
//! - Wire up middleware (request ID, tracing)
//! - Answer preflight requests locally
//! - Resolve, rewrite and relay every other request
//! - Swap runtime settings on config reload

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{request_id::SetRequestIdLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::body::{carries_body, encode_body, read_body};
use crate::http::client::{OutboundRequest, RelayExecutor};
use crate::http::error::ProxyError;
use crate::http::request::{MakeRequestUuid, RequestIdExt};
use crate::http::response::{preflight, relay_response};
use crate::observability::{metrics, spans};
use crate::resilience::RetryPolicy;
use crate::routing::{path_suffix, resolve_target};
use crate::security::{rewrite_headers, AuthTable, ProxyControl};

/// Settings a request reads at its start. Replaced as a whole on reload.
#[derive(Debug)]
pub struct ProxySettings {
    pub auth: AuthTable,
    pub retry: RetryPolicy,
    pub attempt_timeout: Duration,
    pub max_body_size: usize,
}

impl ProxySettings {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            auth: AuthTable::with_providers(&config.auth.providers),
            retry: RetryPolicy::from_config(&config.retries),
            attempt_timeout: config.timeouts.attempt(),
            max_body_size: config.proxy.max_body_size,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ArcSwap<ProxySettings>>,
    pub client: reqwest::Client,
    pub mount_path: Arc<str>,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    settings: Arc<ArcSwap<ProxySettings>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let settings = Arc::new(ArcSwap::from_pointee(ProxySettings::from_config(&config)));
        let mount_path: Arc<str> = normalize_mount(&config.proxy.mount_path).into();

        let state = AppState {
            settings: settings.clone(),
            client: reqwest::Client::new(),
            mount_path,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            settings,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let endpoint: MethodRouter<AppState> = get(proxy_handler)
            .post(proxy_handler)
            .put(proxy_handler)
            .delete(proxy_handler)
            .options(preflight);

        let mount = state.mount_path.to_string();
        let wildcard = format!("{}/{{*path}}", mount);
        // `{*path}` never matches an empty remainder
        let router = if mount.is_empty() {
            Router::new().route("/", endpoint.clone())
        } else {
            Router::new()
                .route(&mount, endpoint.clone())
                .route(&format!("{}/", mount), endpoint.clone())
        };

        router
            .route(&wildcard, endpoint)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(spans::request_span)),
            )
    }

    /// The router, for driving the endpoint without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, applying reloaded configs.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount_path = %self.config.proxy.mount_path,
            "HTTP server starting"
        );

        let settings = self.settings.clone();
        let startup = self.config.clone();
        let reload = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if config.listener.bind_address != startup.listener.bind_address
                    || config.proxy.mount_path != startup.proxy.mount_path
                {
                    tracing::warn!("Listener and mount path changes need a restart; ignoring them");
                }
                settings.store(Arc::new(ProxySettings::from_config(&config)));
                tracing::info!(
                    max_attempts = config.retries.max_attempts,
                    attempt_ms = config.timeouts.attempt_ms,
                    auth_providers = config.auth.providers.len(),
                    "Runtime settings replaced"
                );
            }
        });

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        reload.abort();
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn normalize_mount(mount_path: &str) -> String {
    mount_path.trim_end_matches('/').to_string()
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let settings = state.settings.load_full();

    let response = match forward(&state, &settings, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Proxy request failed");
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn forward(
    state: &AppState,
    settings: &ProxySettings,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();

    let control = ProxyControl::from_headers(&parts.headers);
    let suffix = path_suffix(parts.uri.path(), &state.mount_path);
    let target = resolve_target(control.target.as_deref(), &suffix, parts.uri.query())?;

    let headers = rewrite_headers(
        &parts.headers,
        &target,
        control.api_key.as_deref(),
        &settings.auth,
    )?;

    let body = if carries_body(&parts.method) {
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let raw = read_body(body, &parts.headers, settings.max_body_size).await?;
        encode_body(content_type, raw)?
    } else {
        None
    };

    let outbound = OutboundRequest {
        method: parts.method,
        url: target,
        headers,
        body,
    };

    let executor = RelayExecutor::new(
        state.client.clone(),
        settings.retry.clone(),
        settings.attempt_timeout,
    );

    match executor.execute(&outbound).await {
        Ok(upstream) => Ok(relay_response(upstream)),
        Err(failure) => Err(ProxyError::RelayFailed {
            details: failure.error.to_string(),
            attempts: failure.attempts,
            url: outbound.url.to_string(),
        }),
    }
}
