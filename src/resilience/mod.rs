//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream attempt:
//!     → timeouts.rs (per-attempt deadline)
//!     → On failure: retries.rs (typed classification, attempt budget)
//!     → backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream attempt has a deadline
//! - Connectivity failures retry; upstream answers never do

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{RelayError, RetryPolicy};
pub use timeouts::with_deadline;
