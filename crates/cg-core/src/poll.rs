//! Bounded polling shared by every wait in the system.
//!
//! Readiness waits, endpoint discovery, stop confirmation and DNS propagation
//! all reduce to "check, sleep, check again until a deadline". Keeping that in
//! one place means every wait has an explicit timeout and a typed failure.

use crate::{CoreError, CoreResult};

use std::time::Duration;

use tokio::time::Instant;

/// Poll `check` until it yields `Some`, or fail once `timeout` has elapsed.
///
/// The first check runs immediately. Sleeps never overshoot the deadline, so
/// the final check happens at (or just after) `timeout`.
pub async fn poll_until<F, Fut, T>(
    operation: &str,
    interval: Duration,
    timeout: Duration,
    mut check: F,
) -> CoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();

    loop {
        if let Some(value) = check().await {
            return Ok(value);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(CoreError::timeout(operation, timeout));
        }

        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}
