//! Exponential backoff retry for transient transport failures.
//!
//! Only errors for which [`TransportError::is_retryable`] holds are retried.
//! Codec-level failures never reach this layer.

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Cap on a single delay.
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Extra delay as a fraction of the backoff (0.0 = none).
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter_fraction: 0.1,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `attempt` (1-based), `None` once exhausted.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.config.max_retries {
            return None;
        }
        let exp = self.config.multiplier.powi(attempt as i32 - 1);
        let base_ms = self.config.initial_backoff.as_millis() as f64 * exp;
        let capped_ms = base_ms.min(self.config.max_backoff.as_millis() as f64);
        let jitter_ms = capped_ms * self.config.jitter_fraction * jitter_unit(attempt);
        Some(Duration::from_millis((capped_ms + jitter_ms) as u64))
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    match self.next_delay(attempt) {
                        Some(delay) => {
                            tracing::warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                endpoint = label,
                                "retrying batch submission"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::error!(
                                attempt,
                                error = %e,
                                endpoint = label,
                                "retries exhausted"
                            );
                            return Err(e);
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Deterministic value in `[0, 1)` that varies with the attempt number.
fn jitter_unit(attempt: u32) -> f64 {
    let x = attempt.wrapping_mul(2_654_435_761) >> 16;
    f64::from(x % 1000) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_jitter(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            multiplier: 2.0,
            jitter_fraction: 0.0,
        })
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = no_jitter(4);
        assert_eq!(policy.next_delay(1), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_millis(200)));
        assert_eq!(policy.next_delay(3), Some(Duration::from_millis(350)));
        assert_eq!(policy.next_delay(5), None);
    }

    #[test]
    fn jitter_stays_within_fraction() {
        let policy = RetryPolicy::new(RetryConfig { jitter_fraction: 0.5, ..no_jitter(3).config });
        let d = policy.next_delay(1).unwrap();
        assert!(d >= Duration::from_millis(100) && d < Duration::from_millis(150), "{d:?}");
    }

    #[test]
    fn none_never_retries() {
        assert!(RetryPolicy::new(RetryConfig::none()).next_delay(1).is_none());
    }

    #[tokio::test]
    async fn run_retries_transient_errors() {
        let policy = RetryPolicy::new(RetryConfig {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            ..no_jitter(3).config
        });
        let calls = AtomicU32::new(0);
        let out = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TransportError::Http("connection reset".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_stops_on_permanent_error() {
        let policy = no_jitter(3);
        let calls = AtomicU32::new(0);
        let err = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(TransportError::Status { status: 400, body: "bad".into() }) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 400, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
