//! Timeout enforcement.
//!
//! Each upstream attempt runs under its own deadline. The timer lives inside
//! the returned future, so it is dropped on every exit path: completion,
//! error, or the caller dropping the attempt.

use std::future::Future;
use std::time::Duration;

use crate::resilience::retries::RelayError;

/// Run one attempt under `limit`. Elapsing yields `RelayError::Timeout`.
pub async fn with_deadline<F, T>(limit: Duration, attempt: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(RelayError::Timeout(limit)),
    }
}
