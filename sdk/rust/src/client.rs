use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Default mount path of the proxy endpoint.
pub const DEFAULT_PROXY_PATH: &str = "/api/proxy";

const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// Response body decoded by its content type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProxyPayload {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl ProxyPayload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ProxyPayload::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ProxyPayload::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Body of a POST. Strings go out as-is, JSON values serialized.
#[derive(Debug, Clone)]
pub enum PostBody {
    Text(String),
    Json(Value),
}

impl From<&str> for PostBody {
    fn from(s: &str) -> Self {
        PostBody::Text(s.to_string())
    }
}

impl From<String> for PostBody {
    fn from(s: String) -> Self {
        PostBody::Text(s)
    }
}

impl From<Value> for PostBody {
    fn from(v: Value) -> Self {
        PostBody::Json(v)
    }
}

/// Payload plus the response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub data: ProxyPayload,
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The proxy answered with a non-2xx status.
    #[error("HTTP error! status: {status}, message: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid header value for {0}")]
    InvalidHeader(String),
}

/// Issues requests to a target API through the proxy.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    proxy_url: String,
    target_url: String,
    api_key: Option<String>,
}

impl ProxyClient {
    /// `proxy_url` is the proxy endpoint including its mount path, e.g.
    /// `http://localhost:8080/api/proxy`.
    pub fn new(proxy_url: &str, target_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
            target_url: target_url.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    /// Client for a proxy mounted at the default path on `origin`.
    pub fn for_origin(origin: &str, target_url: &str, api_key: Option<&str>) -> Self {
        let proxy_url = format!("{}{}", origin.trim_end_matches('/'), DEFAULT_PROXY_PATH);
        Self::new(&proxy_url, target_url, api_key)
    }

    pub fn set_target_url(&mut self, target_url: &str) {
        self.target_url = target_url.to_string();
    }

    pub fn set_api_key(&mut self, api_key: &str) {
        self.api_key = Some(api_key.to_string());
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.proxy_url, path.trim_start_matches('/'))
    }

    fn headers(&self, extra: &[(&str, &str)]) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        headers.insert(
            "x-proxy-target",
            HeaderValue::from_str(&self.target_url)
                .map_err(|_| ClientError::InvalidHeader("X-Proxy-Target".into()))?,
        );
        if let Some(key) = &self.api_key {
            headers.insert(
                "x-proxy-api-key",
                HeaderValue::from_str(key)
                    .map_err(|_| ClientError::InvalidHeader("X-Proxy-API-Key".into()))?,
            );
        }
        for (name, value) in extra {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    /// GET `path` below the target and decode the body.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<ProxyPayload, ClientError> {
        let resp = self.get_raw(path, params).await?;
        parse_response(resp).await
    }

    /// POST `body` to `path` below the target and decode the answer.
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<PostBody>,
        extra_headers: &[(&str, &str)],
    ) -> Result<ProxyPayload, ClientError> {
        let mut headers = self.headers(&[])?;
        let request = self.client.post(self.endpoint(path));
        let request = match body.into() {
            PostBody::Text(text) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=UTF-8"));
                request.body(text)
            }
            PostBody::Json(value) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                request.body(value.to_string())
            }
        };
        // caller headers win over the defaults above
        headers.extend(self.headers(extra_headers)?);

        let resp = check_status(request.headers(headers).send().await?).await?;
        parse_response(resp).await
    }

    /// GET without decoding the body.
    pub async fn get_raw(&self, path: &str, params: &[(&str, &str)]) -> Result<Response, ClientError> {
        let resp = self
            .client
            .get(self.endpoint(path))
            .query(params)
            .headers(self.headers(&[])?)
            .send()
            .await?;
        check_status(resp).await
    }

    /// GET and return the decoded body with status and headers.
    pub async fn get_with_metadata(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<ResponseMetadata, ClientError> {
        let resp = self.get_raw(path, params).await?;
        let status = resp.status();
        let headers: HashMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let content_type = headers.get("content-type").cloned();

        Ok(ResponseMetadata {
            data: parse_response(resp).await?,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            content_type,
        })
    }
}

async fn check_status(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Decode by content type: JSON (text when unparsable), text and XML as
/// text, everything else as bytes. No content type means text.
async fn parse_response(resp: Response) -> Result<ProxyPayload, ClientError> {
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let payload = match content_type.as_deref() {
        Some(ct) if ct.contains("application/json") => {
            let text = resp.text().await?;
            match serde_json::from_str(&text) {
                Ok(value) => ProxyPayload::Json(value),
                Err(_) => ProxyPayload::Text(text),
            }
        }
        Some(ct) if ct.contains("text/") || ct.contains("application/xml") => {
            ProxyPayload::Text(resp.text().await?)
        }
        Some(_) => ProxyPayload::Binary(resp.bytes().await?.to_vec()),
        None => ProxyPayload::Text(resp.text().await?),
    };
    Ok(payload)
}
