//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Caller request
//!     → server.rs (Axum setup, OPTIONS short-circuit)
//!     → request.rs (request ID)
//!     → [routing resolves the target, security rewrites headers]
//!     → body.rs (buffer + encode by content type)
//!     → client.rs (relay with deadline, retries, backoff)
//!     → response.rs (header allow-list, CORS)
//!     → Caller response, or error.rs JSON on failure
//! ```

pub mod body;
pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::ProxyError;
pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ProxySettings};
