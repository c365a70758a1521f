use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;

use crate::BackoffPolicy;
use crate::RetryError;

/// Runs `task` up to `policy.max_retries` times, each attempt bounded by
/// `policy.timeout_ms`. The delay between attempts starts at
/// `base_delay_ms` and doubles up to `max_delay_ms`; equal values give a
/// fixed delay. No sleep follows the last attempt.
pub(crate) async fn task_with_timeout_and_backoff<F, T, P, E>(
    task: F,
    policy: BackoffPolicy,
) -> std::result::Result<P, RetryError>
where
    F: Fn() -> T,
    T: std::future::Future<Output = std::result::Result<P, E>>,
    E: std::fmt::Display,
{
    let mut current_delay = Duration::from_millis(policy.base_delay_ms);
    let timeout_duration = Duration::from_millis(policy.timeout_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let max_retries = policy.max_retries.max(1);

    let mut last_error = RetryError::Exhausted {
        attempts: 0,
        last_error: "no attempt made".to_string(),
    };
    for attempt in 0..max_retries {
        match timeout(timeout_duration, task()).await {
            Ok(Ok(r)) => {
                return Ok(r);
            }
            Ok(Err(error)) => {
                debug!(attempt, %error, "attempt failed");
                last_error = RetryError::Exhausted {
                    attempts: attempt + 1,
                    last_error: error.to_string(),
                };
            }
            Err(_) => {
                warn!(attempt, ?timeout_duration, "attempt timed out");
                last_error = RetryError::Timeout(timeout_duration);
            }
        };

        if attempt + 1 < max_retries {
            debug!("Retrying in {:?}...", current_delay);
            sleep(current_delay).await;
            current_delay = (current_delay * 2).min(max_delay);
        }
    }
    debug!("Task failed after {} attempts", max_retries);
    Err(last_error)
}
