use std::time::Duration;

use rand::Rng;

use casa_core::{CasaError, ListingId, RetryConfig};

/// Random wait drawn uniformly from `[min_delay, max_delay]` (millisecond resolution).
pub fn jitter_delay(cfg: &RetryConfig) -> Duration {
    let lo = u64::try_from(cfg.min_delay.as_millis()).unwrap_or(u64::MAX);
    let hi = u64::try_from(cfg.max_delay.as_millis()).unwrap_or(u64::MAX);
    if hi <= lo {
        return cfg.min_delay;
    }
    let mut rng = rand::rng();
    Duration::from_millis(rng.random_range(lo..=hi))
}

/// Run `op` until it succeeds, fails non-transiently, or the attempt budget is spent.
///
/// `call` and `args` identify the operation in logs. Exhaustion is reported as
/// `RetriesExhausted` carrying the last transient error.
pub async fn with_retry<T, F, Fut>(
    cfg: &RetryConfig,
    listing: &ListingId,
    call: &'static str,
    args: &str,
    mut op: F,
) -> Result<T, CasaError>
where
    F: FnMut() -> Fut,
    Fut: core::future::Future<Output = Result<T, CasaError>>,
{
    let max_attempts = cfg.max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let err = match op().await {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => e,
        };
        if attempt >= max_attempts {
            tracing::error!(
                listing = %listing,
                call,
                args,
                attempts = attempt,
                error = %err,
                "retries exhausted"
            );
            return Err(CasaError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }
        let wait = jitter_delay(cfg);
        tracing::warn!(
            listing = %listing,
            call,
            args,
            attempt,
            max_attempts,
            wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient failure; retrying"
        );
        tokio::time::sleep(wait).await;
    }
}
