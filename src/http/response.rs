//! Response handling for the caller.
//!
//! # Responsibilities
//! - Copy the allow-listed target headers
//! - Add the permissive CORS headers to every relayed response
//! - Answer preflight requests locally

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::client::UpstreamResponse;

/// Target response headers passed back to the caller.
pub const RELAYED_RESPONSE_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CACHE_CONTROL,
    header::EXPIRES,
    header::LAST_MODIFIED,
];

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str =
    "Content-Type, Authorization, X-API-Key, X-Proxy-Target, X-Proxy-API-Key";

/// Set the three CORS headers.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Convert a target response into the caller's response.
pub fn relay_response(upstream: UpstreamResponse) -> Response {
    let mut headers = HeaderMap::new();
    for name in RELAYED_RESPONSE_HEADERS.iter() {
        if let Some(value) = upstream.headers.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    apply_cors(&mut headers);

    (upstream.status, headers, Body::from(upstream.body)).into_response()
}

/// Local answer to an `OPTIONS` preflight.
pub async fn preflight() -> Response {
    let mut headers = HeaderMap::new();
    apply_cors(&mut headers);
    (StatusCode::OK, headers).into_response()
}
