use std::future::Future;
use std::time::Duration;

/// Bounded exponential-backoff retry around a fallible async operation.
///
/// The delay before attempt `n + 1` is `multiplier * 2^(n - 1)` seconds,
/// clamped to `[min_delay, max_delay]`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            multiplier: 1,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let raw = Duration::from_secs(exp.saturating_mul(u64::from(self.multiplier)));
        raw.clamp(self.min_delay, self.max_delay)
    }

    pub async fn run<T, F, Fut, P>(&self, mut op: F, is_retryable: P) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        P: Fn(&anyhow::Error) -> bool,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) => {
                    if attempt >= self.max_attempts || !is_retryable(&err) {
                        return Err(err);
                    }
                    let backoff = self.delay_for(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "transient failure; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Connection failures and timeouts anywhere in the error chain.
pub fn is_transient_transport_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_connect() || e.is_timeout())
    })
}
