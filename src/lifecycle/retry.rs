use crate::config::RuntimeConfig;
use crate::error::{IsRetryable, RuntimeError};
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Timeout and bounded retry applied to every runtime adapter call.
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    timeout: Duration,
    stop_grace: Duration,
    backoff: ExponentialBuilder,
}

impl CallPolicy {
    pub fn from_config(cfg: &RuntimeConfig) -> Self {
        Self {
            timeout: cfg.call_timeout(),
            stop_grace: cfg.stop_grace(),
            backoff: ExponentialBuilder::default()
                .with_min_delay(cfg.retry_min_delay())
                .with_max_delay(cfg.retry_max_delay())
                .with_max_times(cfg.retry_max_times)
                .with_jitter(),
        }
    }

    /// Policy for stop calls: the runtime may wait out the grace period before
    /// it kills the resource, so that wait is added to the timeout.
    pub fn for_stop(self) -> Self {
        Self {
            timeout: self.timeout + self.stop_grace,
            ..self
        }
    }

    /// Run `call` under the timeout; unreachable and timed-out attempts are retried.
    pub async fn run<T, F, Fut>(&self, op: &'static str, name: &str, call: F) -> Result<T, RuntimeError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RuntimeError>>,
    {
        let timeout = self.timeout;
        (|| async {
            match tokio::time::timeout(timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(RuntimeError::Timeout(timeout)),
            }
        })
        .retry(self.backoff)
        .when(|e: &RuntimeError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                op,
                resource = name,
                error = %err,
                "Runtime call failed, retrying in {:?}",
                dur
            );
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(retries: usize, timeout_ms: u64) -> CallPolicy {
        CallPolicy::from_config(&RuntimeConfig {
            call_timeout_ms: timeout_ms,
            stop_grace_secs: 1,
            retry_max_times: retries,
            retry_min_delay_ms: 1,
            retry_max_delay_ms: 5,
            ..RuntimeConfig::default()
        })
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let attempts = AtomicUsize::new(0);
        let result = policy(3, 1_000)
            .run("get", "w", || async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RuntimeError::Unavailable("down".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.expect("third attempt succeeds"), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rejections_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), _> = policy(3, 1_000)
            .run("start", "w", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RuntimeError::Rejected("no".to_string()))
            })
            .await;

        assert!(matches!(result, Err(RuntimeError::Rejected(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let result: Result<(), _> = policy(0, 20)
            .run("stop", "w", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(RuntimeError::Timeout(_))));
    }

    #[tokio::test]
    async fn stop_calls_wait_out_the_grace_period() {
        let policy = policy(0, 20);
        let slow_stop = || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        };

        let plain: Result<(), _> = policy.run("stop", "w", slow_stop).await;
        assert!(matches!(plain, Err(RuntimeError::Timeout(_))));

        policy
            .for_stop()
            .run("stop", "w", slow_stop)
            .await
            .expect("grace period covers the stop");
    }
}
