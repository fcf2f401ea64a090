//! Request spans.
//!
//! The span carries the request id so the attempt logs emitted by the relay
//! executor can be correlated per proxied call.

use axum::body::Body;
use axum::http::Request;
use tracing::Span;

use crate::http::request::RequestIdExt;

/// Span for one inbound request. The query string is not recorded.
pub fn request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "proxy_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request.request_id(),
    )
}
