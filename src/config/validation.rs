//! Configuration validation.
//!
//! Serde handles the syntax; this checks value ranges and the custom auth
//! rows. Every problem is collected, not just the first one.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::{AuthProviderConfig, ProxyConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("proxy.mount_path must start with '/': {0}")]
    InvalidMountPath(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({max})")]
    DelayOrder { base: u64, max: u64 },

    #[error("retries.jitter_ratio must be within 0.0..=1.0, got {0}")]
    JitterOutOfRange(f64),

    #[error("auth provider #{index}: {reason}")]
    Provider { index: usize, reason: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if !config.proxy.mount_path.starts_with('/') {
        errors.push(ValidationError::InvalidMountPath(config.proxy.mount_path.clone()));
    }

    if config.proxy.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "proxy.max_body_size" });
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero { field: "retries.max_attempts" });
    }

    if config.timeouts.attempt_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.attempt_ms" });
    }

    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::DelayOrder {
            base: config.retries.base_delay_ms,
            max: config.retries.max_delay_ms,
        });
    }

    let jitter = config.retries.jitter_ratio;
    if !(0.0..=1.0).contains(&jitter) {
        errors.push(ValidationError::JitterOutOfRange(jitter));
    }

    for (index, provider) in config.auth.providers.iter().enumerate() {
        if let Err(reason) = validate_provider(provider) {
            errors.push(ValidationError::Provider { index, reason });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check one auth row. Shared with the auth table builder.
pub fn validate_provider(provider: &AuthProviderConfig) -> Result<(), String> {
    if provider.name.trim().is_empty() {
        return Err("name is empty".to_string());
    }
    if provider.host_contains.trim().is_empty() {
        return Err(format!("{}: host_contains is empty", provider.name));
    }
    if provider.headers.is_empty() {
        return Err(format!("{}: no headers configured", provider.name));
    }
    for (name, template) in &provider.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(format!("{}: invalid header name {:?}", provider.name, name));
        }
        // the key is substituted at request time, so check the literal parts
        if HeaderValue::from_str(&template.replace("{key}", "")).is_err() {
            return Err(format!("{}: invalid header value for {}", provider.name, name));
        }
    }
    Ok(())
}
