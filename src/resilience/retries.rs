//! Retry classification and policy.
//!
//! # Design Decisions
//! - Failures are typed where they happen (the upstream call), so the retry
//!   loop never inspects error text
//! - Only `Timeout` and `ConnectionFailure` are retried
//! - Upstream HTTP error statuses (4xx and 5xx alike) are final

use std::time::Duration;

use thiserror::Error;

use crate::config::RetryConfig;
use crate::resilience::backoff::{calculate_backoff, with_jitter};

/// Outcome of a failed upstream attempt.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::Timeout(_) | RelayError::ConnectionFailure(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Timeout(_) => "timeout",
            RelayError::ConnectionFailure(_) => "connection_failure",
            RelayError::UpstreamStatus { .. } => "upstream_status",
            RelayError::Other(_) => "other",
        }
    }
}

impl RelayError {
    /// Classify a client error from an attempt running under `limit`.
    pub fn from_reqwest(e: reqwest::Error, limit: Duration) -> Self {
        if e.is_timeout() {
            RelayError::Timeout(limit)
        } else if e.is_connect() || e.is_request() || e.is_body() {
            RelayError::ConnectionFailure(e.to_string())
        } else {
            RelayError::Other(e.to_string())
        }
    }
}

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ratio: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_ratio: config.jitter_ratio,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = calculate_backoff(
            attempt,
            self.base_delay.as_millis() as u64,
            self.max_delay.as_millis() as u64,
        );
        with_jitter(delay, self.jitter_ratio)
    }

    /// Whether the loop continues after `error` ended attempt `attempt`.
    pub fn should_retry(&self, attempt: u32, error: &RelayError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
