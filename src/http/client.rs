//! Upstream relay with bounded retries.
//!
//! # State Machine
//! ```text
//! Attempting(n) → Success
//!               → AttemptFailed(n)
//!                   → n == max_attempts         → AllFailed
//!                   → Timeout | ConnectionFailure → sleep(backoff(n)) → Attempting(n+1)
//!                   → UpstreamStatus | Other     → AllFailed
//! ```

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::observability::metrics;
use crate::resilience::{with_deadline, RelayError, RetryPolicy};

/// A fully prepared request for the target.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A successful (2xx) target response, body fully read.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The error that ended the loop and how many attempts were made.
#[derive(Debug)]
pub struct RelayFailure {
    pub error: RelayError,
    pub attempts: u32,
}

/// Performs the outbound call under the retry policy.
#[derive(Debug, Clone)]
pub struct RelayExecutor {
    client: reqwest::Client,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl RelayExecutor {
    pub fn new(client: reqwest::Client, policy: RetryPolicy, attempt_timeout: Duration) -> Self {
        Self {
            client,
            policy,
            attempt_timeout,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Relay `request`, retrying connectivity failures with backoff.
    pub async fn execute(&self, request: &OutboundRequest) -> Result<UpstreamResponse, RelayFailure> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            tracing::info!(
                attempt,
                max_attempts,
                method = %request.method,
                url = %request.url,
                "Proxy attempt"
            );

            match with_deadline(self.attempt_timeout, self.send_once(request)).await {
                Ok(response) => {
                    metrics::record_attempt("success");
                    tracing::info!(
                        attempt,
                        status = %response.status,
                        url = %request.url,
                        "Proxy success"
                    );
                    return Ok(response);
                }
                Err(error) => {
                    metrics::record_attempt(error.kind());
                    let retry = self.policy.should_retry(attempt, &error);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        url = %request.url,
                        error = %error,
                        kind = error.kind(),
                        retryable = error.is_retryable(),
                        "Proxy attempt failed"
                    );

                    if !retry {
                        tracing::error!(
                            attempts = attempt,
                            url = %request.url,
                            last_error = %error,
                            "All proxy attempts failed"
                        );
                        return Err(RelayFailure { error, attempts: attempt });
                    }

                    let delay = self.policy.backoff(attempt);
                    tracing::info!(attempt, delay = ?delay, "Retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(&self, request: &OutboundRequest) -> Result<UpstreamResponse, RelayError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let classify = |e: reqwest::Error| RelayError::from_reqwest(e, self.attempt_timeout);
        let response = builder.send().await.map_err(classify)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.map_err(classify)?;
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;
        Ok(UpstreamResponse { status, headers, body })
    }
}
