//! One provider call under timeout, retry and the shared deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::policy::RetryPolicy;
use crate::models::Source;
use crate::providers::{ProviderError, ProviderResult};

/// How a provider call ended
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    /// Excluded by the caller
    Skipped,
    Finished {
        result: ProviderResult<T>,
        attempts: u32,
        elapsed: Duration,
        /// The global deadline, not the per-call timeout, ended the last attempt
        cut_by_deadline: bool,
    },
}

/// Run `call` until it succeeds, fails permanently, exhausts its retries or runs out of time.
///
/// Each attempt gets `timeout` clipped to what is left before `deadline`. Only `Timeout`
/// and `Unavailable` are retried, and only when the jittered backoff fits before the deadline.
pub(crate) async fn call_with_retry<T, F, Fut>(
    source: Source,
    retry: &RetryPolicy,
    timeout: Duration,
    deadline: Instant,
    mut call: F,
) -> Outcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let budget = timeout.min(remaining);
        let clipped = budget < timeout;

        let result = if budget.is_zero() {
            Err(ProviderError::Timeout(budget))
        } else {
            match tokio::time::timeout(budget, call()).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(budget)),
            }
        };

        let error = match result {
            Ok(value) => {
                debug!(%source, attempts, elapsed_ms = started.elapsed().as_millis() as u64, "Provider call succeeded");
                return Outcome::Finished {
                    result: Ok(value),
                    attempts,
                    elapsed: started.elapsed(),
                    cut_by_deadline: false,
                };
            }
            Err(error) => error,
        };

        let cut_by_deadline = clipped && matches!(error, ProviderError::Timeout(_));
        if error.is_retryable() && attempts <= retry.max_retries && !cut_by_deadline {
            let delay = retry.backoff_delay(attempts);
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining > delay {
                warn!(%source, attempt = attempts, delay_ms = delay.as_millis() as u64, %error, "Provider call failed, retrying");
                tokio::time::sleep(delay).await;
                continue;
            }
            warn!(%source, attempts, %error, "Provider call failed, no time left to retry");
        } else if matches!(error, ProviderError::InvalidResponse(_)) {
            warn!(%source, attempts, %error, "Provider returned data that failed validation");
        } else {
            warn!(%source, attempts, %error, "Provider call failed");
        }

        return Outcome::Finished {
            result: Err(error),
            attempts,
            elapsed: started.elapsed(),
            cut_by_deadline,
        };
    }
}
