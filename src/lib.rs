//! Forwarding proxy for the personal dashboard.
//!
//! Browser widgets call `/api/proxy/<path>` with an `X-Proxy-Target` base
//! URL and an optional `X-Proxy-API-Key`. The proxy resolves the target,
//! injects the auth headers the target host expects, relays with per-attempt
//! deadlines and retries, and answers with CORS headers attached.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
