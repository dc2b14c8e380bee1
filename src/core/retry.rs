//! Retry logic with exponential backoff
//!
//! This module provides a configurable retry mechanism for transient
//! registry failures. Whether an error is retryable is decided by the
//! caller through a typed predicate; the manager itself only schedules
//! attempts and backoff.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry manager for executing operations with exponential backoff
///
/// # Examples
///
/// ```no_run
/// use release_train::core::{RetryManager, RetryOptions};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let manager = RetryManager::new(RetryOptions::default());
///
///     let result = manager
///         .retry(
///             || async {
///                 // Your operation here
///                 Ok::<_, anyhow::Error>("success")
///             },
///             |_error| false,
///         )
///         .await?;
///
///     assert_eq!(result, "success");
///     Ok(())
/// }
/// ```
pub struct RetryManager {
    options: RetryOptions,
}

impl RetryManager {
    /// Create a new RetryManager with the given options
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Execute the given async operation with retry logic
    ///
    /// # Arguments
    ///
    /// * `operation` - Async function that returns a Result
    /// * `is_retryable` - Predicate deciding whether a failed attempt may
    ///   be repeated; a non-retryable error is returned immediately
    pub async fn retry<F, Fut, T, E>(
        &self,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut delay = self.options.initial_delay;
        let mut last_error: Option<E> = None;

        for attempt in 1..=self.options.max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if !is_retryable(&error) {
                        return Err(error);
                    }

                    // Last attempt
                    if attempt >= self.options.max_attempts {
                        return Err(error);
                    }

                    last_error = Some(error);

                    // Wait before retry with exponential backoff
                    sleep(delay).await;

                    delay = Duration::from_secs_f64(
                        delay.as_secs_f64() * self.options.backoff_multiplier,
                    )
                    .min(self.options.max_delay);
                }
            }
        }

        // max_attempts >= 1, so the loop always returns before this point
        // unless every attempt was retryable
        Err(last_error.expect("retry loop exited without an error"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RegistryError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient(details: &str) -> RegistryError {
        RegistryError::TransientNetwork {
            registry: "test".to_string(),
            details: details.to_string(),
        }
    }

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let manager = RetryManager::new(RetryOptions::default());

        let result = manager
            .retry(|| async { Ok::<_, RegistryError>(42) }, RegistryError::is_retryable)
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_success_after_transient_failures() {
        let manager = RetryManager::new(RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        });

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(
                move || {
                    let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if count < 2 {
                            Err(transient("ECONNREFUSED"))
                        } else {
                            Ok::<_, RegistryError>("success")
                        }
                    }
                },
                RegistryError::is_retryable,
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_reached() {
        let manager = RetryManager::new(RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        });

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move { Err::<i32, _>(transient("ECONNRESET")) }
                },
                RegistryError::is_retryable,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_immediately() {
        let manager = RetryManager::new(RetryOptions::default());

        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = manager
            .retry(
                move || {
                    counter_clone.fetch_add(1, Ordering::SeqCst);
                    async move {
                        Err::<i32, _>(RegistryError::VersionAlreadyExists {
                            registry: "crates-io".to_string(),
                        })
                    }
                },
                RegistryError::is_retryable,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exponential_backoff() {
        let manager = RetryManager::new(RetryOptions {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
        });

        let start = std::time::Instant::now();

        let _result = manager
            .retry(
                || async { Err::<i32, _>(transient("timeout")) },
                RegistryError::is_retryable,
            )
            .await;

        let elapsed = start.elapsed();

        // Delays: 10ms + 20ms (attempt 3 returns without waiting)
        assert!(
            elapsed >= Duration::from_millis(30),
            "Expected at least 30ms, got {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_max_delay_cap() {
        let manager = RetryManager::new(RetryOptions {
            max_attempts: 4,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(200),
            backoff_multiplier: 3.0,
        });

        let start = std::time::Instant::now();

        let _result = manager
            .retry(
                || async { Err::<i32, _>(transient("timeout")) },
                RegistryError::is_retryable,
            )
            .await;

        let elapsed = start.elapsed();

        // Delays: 100, 200 (capped), 200 (capped); last attempt does not wait
        assert!(
            elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(1000),
            "Expected 500-1000ms, got {:?}",
            elapsed
        );
    }

    #[test]
    fn test_retry_options_default() {
        let options = RetryOptions::default();

        assert_eq!(options.max_attempts, 3);
        assert_eq!(options.initial_delay, Duration::from_secs(1));
        assert_eq!(options.max_delay, Duration::from_secs(30));
        assert_eq!(options.backoff_multiplier, 2.0);
    }
}
