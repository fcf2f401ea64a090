//! Security subsystem: what the proxy lets through and what it adds.
//!
//! # Data Flow
//! ```text
//! Inbound headers:
//!     → headers.rs (read control headers, apply the allow-list)
//!     → auth.rs (pick the target's auth scheme, inject the key)
//!     → Outbound headers
//! ```
//!
//! # Design Decisions
//! - Allow-list, never deny-list: unknown inbound headers are dropped
//! - Proxy-control headers never reach the target

pub mod auth;
pub mod headers;

pub use auth::{AuthScheme, AuthTable, HeaderTemplate};
pub use headers::{rewrite_headers, HeaderError, ProxyControl, X_PROXY_API_KEY, X_PROXY_TARGET};
