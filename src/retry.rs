//! Bounded retry with exponential backoff and jitter for feed fetches.
//!
//! Transient network errors or 5xx responses from either CSV host should
//! not fail a whole fragment when a second attempt would succeed.

use anyhow::Result;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::warn;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial try)
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,
    /// Cap for the exponential backoff delay
    pub max_delay_ms: u64,
    /// Maximum total elapsed time across all attempts
    pub max_elapsed_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 200,
            max_delay_ms: 3000,
            max_elapsed_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Load retry policy from environment variables with safe defaults.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_attempts: env_u64("RETRY_MAX_ATTEMPTS", default.max_attempts as u64)
                .clamp(1, 10) as u32,
            base_delay_ms: env_u64("RETRY_BASE_DELAY_MS", default.base_delay_ms),
            max_delay_ms: env_u64("RETRY_MAX_DELAY_MS", default.max_delay_ms),
            max_elapsed_ms: env_u64("RETRY_MAX_ELAPSED_MS", default.max_elapsed_ms),
        }
    }

    /// Backoff delay for a given attempt with full jitter:
    /// random value in [0, min(max_delay, base * 2^(attempt-1))).
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1);
        let multiplier = if exponent >= 32 {
            u64::MAX
        } else {
            1u64 << exponent
        };
        let capped = self
            .base_delay_ms
            .saturating_mul(multiplier)
            .min(self.max_delay_ms);
        if capped == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..capped)
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

/// Run an async operation under the policy, retrying on any error until the
/// attempt or elapsed-time budget is spent. The last error is returned with
/// the operation name attached.
pub async fn retry_async<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                if attempt >= policy.max_attempts || elapsed_ms >= policy.max_elapsed_ms {
                    return Err(e.context(format!("{what}: giving up after {attempt} attempts")));
                }
                let delay = policy.backoff_ms(attempt);
                warn!(
                    "{what}: attempt {attempt} failed ({e:#}), retrying in {delay}ms"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_is_bounded() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 1500,
            max_elapsed_ms: 10_000,
        };
        for attempt in 1..=8 {
            let delay = policy.backoff_ms(attempt);
            assert!(delay < 1500, "attempt {attempt} delay {delay} over cap");
        }
    }

    #[test]
    fn test_backoff_no_overflow_on_huge_attempt() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff_ms(64) < policy.max_delay_ms);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            max_elapsed_ms: 1000,
        };
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry_async(&policy, "test op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(anyhow!("transient"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
            max_elapsed_ms: 1000,
        };
        let calls = AtomicU32::new(0);
        let result: Result<u32> = retry_async(&policy, "doomed op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow!("permanent")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(format!("{:#}", result.unwrap_err()).contains("doomed op"));
    }
}
