//! Outbound header rewriting.
//!
//! # Responsibilities
//! - Read the proxy-control headers (`X-Proxy-Target`, `X-Proxy-API-Key`)
//! - Forward only the allow-listed inbound headers
//! - Inject the target's authentication headers when a key is supplied

use axum::http::header::{self, HeaderMap, HeaderName, InvalidHeaderValue};
use thiserror::Error;
use url::Url;

use crate::security::auth::AuthTable;

/// Target base URL of the real API.
pub const X_PROXY_TARGET: HeaderName = HeaderName::from_static("x-proxy-target");

/// Opaque credential for the target.
pub const X_PROXY_API_KEY: HeaderName = HeaderName::from_static("x-proxy-api-key");

/// Inbound headers carried to the target. Everything else is dropped.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::AUTHORIZATION,
    header::ACCEPT,
    header::USER_AGENT,
];

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("API key cannot be sent as a header value for {scheme}: {source}")]
    InvalidApiKey {
        scheme: String,
        #[source]
        source: InvalidHeaderValue,
    },
}

/// Values of the proxy-control headers. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyControl {
    pub target: Option<String>,
    pub api_key: Option<String>,
}

impl ProxyControl {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            target: non_empty(headers, &X_PROXY_TARGET),
            api_key: non_empty(headers, &X_PROXY_API_KEY),
        }
    }
}

fn non_empty(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Build the header set sent to `target`.
pub fn rewrite_headers(
    inbound: &HeaderMap,
    target: &Url,
    api_key: Option<&str>,
    auth: &AuthTable,
) -> Result<HeaderMap, HeaderError> {
    let mut outbound = HeaderMap::new();

    for name in FORWARDED_REQUEST_HEADERS.iter() {
        if let Some(value) = inbound.get(name) {
            outbound.insert(name.clone(), value.clone());
        }
    }

    if let Some(api_key) = api_key {
        let hostname = target.host_str().unwrap_or_default();
        let scheme = auth.select(hostname);
        tracing::debug!(host = %hostname, scheme = scheme.name(), "Applying auth scheme");
        scheme
            .apply(api_key, &mut outbound)
            .map_err(|source| HeaderError::InvalidApiKey {
                scheme: scheme.name().to_string(),
                source,
            })?;
    }

    Ok(outbound)
}
