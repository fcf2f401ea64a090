//! Startup orchestration.
//!
//! Order: config → logging → metrics → listener → watcher → serve. Any
//! failure before serving is fatal.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{load_config, ConfigError, ProxyConfig};
use crate::config::watcher::ConfigWatcher;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::{logging, metrics};

/// Command line inputs of the server.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub watch: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address {value}: {source}")]
    MetricsAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the config file when given, defaults otherwise.
pub fn resolve_config(options: &StartupOptions) -> Result<ProxyConfig, ConfigError> {
    match &options.config_path {
        Some(path) => load_config(path),
        None => Ok(ProxyConfig::default()),
    }
}

/// The Prometheus listener address.
pub fn metrics_address(config: &ProxyConfig) -> Result<SocketAddr, StartupError> {
    let value = &config.observability.metrics_address;
    value.parse().map_err(|source| StartupError::MetricsAddress {
        value: value.clone(),
        source,
    })
}

/// Start every subsystem and serve until a stop signal arrives.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = resolve_config(&options)?;
    logging::init_logging(&config.observability)?;

    tracing::info!("dashboard-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_path = %config.proxy.mount_path,
        max_attempts = config.retries.max_attempts,
        attempt_ms = config.timeouts.attempt_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(metrics_address(&config)?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // the watcher handle must outlive the server
    let (_watcher, config_updates) = match (&options.config_path, options.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
