//! Inbound body to outbound body.
//!
//! - GET/HEAD: nothing is read or sent
//! - `application/json`: parsed and re-serialized, so malformed payloads
//!   never reach the target
//! - `multipart/form-data`: relayed as-is together with its boundary
//! - anything else: raw passthrough

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Method};
use http_body_util::LengthLimitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Invalid JSON body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read request body: {0}")]
    Read(String),

    #[error("Request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// How a body is carried to the target, by declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Multipart,
    Raw,
}

impl BodyKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.contains("application/json") => BodyKind::Json,
            Some(ct) if ct.contains("multipart/form-data") => BodyKind::Multipart,
            _ => BodyKind::Raw,
        }
    }
}

/// Whether requests with this method carry a body to the target.
pub fn carries_body(method: &Method) -> bool {
    method != Method::GET && method != Method::HEAD
}

/// Buffer the inbound body, refusing declared lengths above `limit` up front
/// and streams that run past it.
pub async fn read_body(body: Body, headers: &HeaderMap, limit: usize) -> Result<Bytes, BodyError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(BodyError::TooLarge { limit });
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let source = e.into_inner();
        if source.downcast_ref::<LengthLimitError>().is_some() {
            BodyError::TooLarge { limit }
        } else {
            BodyError::Read(source.to_string())
        }
    })
}

/// Encode the body for the outbound request. Empty bodies are not sent.
pub fn encode_body(content_type: Option<&str>, raw: Bytes) -> Result<Option<Bytes>, BodyError> {
    let body = match BodyKind::from_content_type(content_type) {
        BodyKind::Json => {
            let value: serde_json::Value = serde_json::from_slice(&raw)?;
            Bytes::from(serde_json::to_vec(&value)?)
        }
        BodyKind::Multipart | BodyKind::Raw => raw,
    };

    Ok(Some(body).filter(|b| !b.is_empty()))
}
