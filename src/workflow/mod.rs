pub mod compensation;

use crate::error::Error;
use log::warn;
use std::future::Future;
use std::time::Duration;

/// Per-activity retry policy: bounded attempts, each with a
/// start-to-close timeout. Retryable failures and timeouts consume an
/// attempt; caller mistakes fail immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub maximum_attempts: u32,
    pub start_to_close: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            maximum_attempts: 3,
            start_to_close: Duration::from_secs(30),
        }
    }
}

pub async fn execute_activity<T, F, Fut>(
    policy: &RetryPolicy,
    activity: &'static str,
    run: F,
) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut last_error: Option<Error> = None;

    for attempt in 1..=policy.maximum_attempts {
        match tokio::time::timeout(policy.start_to_close, run()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => {
                if !e.is_retryable() {
                    return Err(e);
                }
                warn!(
                    "activity {} attempt {}/{} failed: {}",
                    activity, attempt, policy.maximum_attempts, e
                );
                last_error = Some(e);
            }
            Err(_) => {
                warn!(
                    "activity {} attempt {}/{} timed out after {:?}",
                    activity, attempt, policy.maximum_attempts, policy.start_to_close
                );
                last_error = Some(Error::Transient(format!(
                    "{} exceeded start-to-close timeout",
                    activity
                )));
            }
        }
    }

    Err(Error::ActivityExhausted {
        activity,
        attempts: policy.maximum_attempts,
        source: Box::new(last_error.unwrap_or_else(|| Error::Transient("no attempts ran".to_string()))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            maximum_attempts: 3,
            start_to_close: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();

        let result = execute_activity(&quick_policy(), "flaky", move || {
            let calls = calls_in.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Transient("not yet".to_string()))
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
    async fn test_exhausts_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();

        let result: Result<(), Error> = execute_activity(&quick_policy(), "down", move || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Transient("still down".to_string()))
            }
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            Error::ActivityExhausted { attempts: 3, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_caller_error_fails_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();

        let result: Result<(), Error> = execute_activity(&quick_policy(), "bad-input", move || {
            let calls = calls_in.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::InvalidInput("from==to".to_string()))
            }
        })
        .await;

        assert!(matches!(result.unwrap_err(), Error::InvalidInput(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_consumes_attempt() {
        let policy = RetryPolicy {
            maximum_attempts: 2,
            start_to_close: Duration::from_millis(20),
        };

        let result: Result<(), Error> = execute_activity(&policy, "slow", || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result.unwrap_err(),
            Error::ActivityExhausted { attempts: 2, .. }
        ));
    }
}
