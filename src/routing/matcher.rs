//! Hostname matching for the authentication table.
//!
//! # Design Decisions
//! - Matching is case-insensitive (hostnames are case-insensitive)
//! - Substring containment, so `api.notion.com` and `notion.com` both match
//!   a `notion.com` row
//! - No regex

/// Trait for matching a resolved target hostname.
pub trait HostMatcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the hostname matches this condition.
    fn matches(&self, hostname: &str) -> bool;
}

/// Matches hostnames containing a fixed needle.
#[derive(Debug, Clone)]
pub struct HostContains {
    needle: String,
}

impl HostContains {
    /// The needle is normalized to lowercase for case-insensitive matching.
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into().to_lowercase(),
        }
    }
}

impl HostMatcher for HostContains {
    fn matches(&self, hostname: &str) -> bool {
        hostname.to_lowercase().contains(&self.needle)
    }
}

/// Matches every hostname. Used for the fallback row.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyHost;

impl HostMatcher for AnyHost {
    fn matches(&self, _hostname: &str) -> bool {
        true
    }
}
