//! Exponential backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

/// Delay before the attempt following `attempt`: `min(base * 2^(attempt-1), max)`.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    Duration::from_millis(delay_ms.min(max_ms))
}

/// Add up to `ratio * delay` of random jitter. A zero ratio returns `delay`.
pub fn with_jitter(delay: Duration, ratio: f64) -> Duration {
    let jitter_range = (delay.as_millis() as f64 * ratio) as u64;
    if jitter_range == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_range))
}
