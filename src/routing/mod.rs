//! Routing subsystem: where a proxied request goes.
//!
//! # Data Flow
//! ```text
//! inbound path + X-Proxy-Target + query
//!     → target.rs (strip mount prefix, join onto base, append query)
//!     → resolved Url
//!     → matcher.rs (hostname checks used by security::auth)
//! ```

pub mod matcher;
pub mod target;

pub use matcher::{AnyHost, HostContains, HostMatcher};
pub use target::{path_suffix, resolve_target, TargetError};
