//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → spans.rs (per-request span with the request id)
//!     → logging.rs (structured log events, pretty or JSON)
//!     → metrics.rs (counters and histograms, Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
pub mod spans;
