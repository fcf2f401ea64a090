//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! proxy.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → http::ProxySettings snapshot shared via ArcSwap
//!
//! With --watch:
//!     watcher.rs detects change
//!     → loader.rs loads + validates
//!     → server swaps the settings snapshot
//! ```

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuthConfig, AuthProviderConfig, EndpointConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ProxyConfig, RetryConfig, TimeoutConfig,
};
