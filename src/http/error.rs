//! Error surface of the proxy endpoint.
//!
//! Every failure becomes a JSON body; nothing escapes as a dropped
//! connection.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::http::body::BodyError;
use crate::routing::TargetError;
use crate::security::HeaderError;

/// Generic failure label shown to callers.
pub const PROXY_FAILED: &str = "Proxy request failed";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Body(#[from] BodyError),

    /// The relay loop ended without a successful response.
    #[error("{details} (after {attempts} attempts to {url})")]
    RelayFailed {
        details: String,
        attempts: u32,
        url: String,
    },
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Target(_) => StatusCode::BAD_REQUEST,
            ProxyError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Header(_) | ProxyError::Body(_) | ProxyError::RelayFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ProxyError::Target(e) => json!({ "error": e.to_string() }),
            ProxyError::RelayFailed {
                details,
                attempts,
                url,
            } => json!({
                "error": PROXY_FAILED,
                "details": details,
                "attempts": attempts,
                "url": url,
            }),
            ProxyError::Header(e) => json!({ "error": PROXY_FAILED, "details": e.to_string() }),
            ProxyError::Body(e) => json!({ "error": PROXY_FAILED, "details": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_target_body() {
        let response = ProxyError::from(TargetError::Missing).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "Missing X-Proxy-Target header" }));
    }

    #[tokio::test]
    async fn test_relay_failure_body() {
        let response = ProxyError::RelayFailed {
            details: "HTTP 404: gone".into(),
            attempts: 1,
            url: "https://example.com/x".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({
                "error": "Proxy request failed",
                "details": "HTTP 404: gone",
                "attempts": 1,
                "url": "https://example.com/x",
            })
        );
    }

    #[tokio::test]
    async fn test_body_error_is_server_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let response = ProxyError::from(BodyError::from(parse)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Proxy request failed");
        assert!(body["details"].as_str().unwrap().starts_with("Invalid JSON body"));
    }
}
