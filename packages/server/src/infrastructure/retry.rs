//! Retry utilities for store and bus calls.
//!
//! Exponential backoff for operations at the store/bus boundary. Only
//! idempotent operations should be wrapped: a retried `INCR` whose reply was
//! lost would be applied twice.

use std::{fmt::Display, future::Future, time::Duration};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = try once)
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Maximum delay (caps exponential growth)
    pub max_delay: Duration,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy with custom max retries
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Policy that runs the operation exactly once
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Calculate delay for a given attempt using exponential backoff
    fn calculate_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponential = self.base_delay.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);
        Duration::from_millis(exponential as u64).min(self.max_delay)
    }
}

/// Execute an operation with retry logic and exponential backoff
///
/// Returns the first success, or the last error once all retries are used up.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let delay = policy.calculate_delay(attempt);
            tracing::debug!(
                operation = operation_name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying operation after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < policy.max_retries => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_retries = policy.max_retries,
                    error = %e,
                    "Operation failed"
                );
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_calculate_delay_is_capped() {
        // テスト項目: 遅延は指数的に伸び、上限で頭打ちになる
        // given (前提条件):
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
        };

        // then (期待する結果):
        assert_eq!(policy.calculate_delay(0), Duration::ZERO);
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(400));
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_failures() {
        // テスト項目: 途中で成功すればその値が返る
        // given (前提条件):
        let calls = Arc::new(AtomicU32::new(0));

        // when (操作):
        let result: Result<u32, String> = with_retry(&fast_policy(3), "flaky", || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 { Err(format!("failure {n}")) } else { Ok(n) }
            }
        })
        .await;

        // then (期待する結果):
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_returns_last_error() {
        // テスト項目: リトライを使い切ると最後のエラーが返る
        // given (前提条件):
        let calls = Arc::new(AtomicU32::new(0));

        // when (操作):
        let result: Result<(), String> = with_retry(&fast_policy(2), "always-failing", || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(format!("failure {n}"))
            }
        })
        .await;

        // then (期待する結果): 初回 + リトライ 2 回
        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_none_runs_once() {
        // テスト項目: RetryPolicy::none() では 1 回しか実行されない
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), String> = with_retry(&RetryPolicy::none(), "once", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope".to_string())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
