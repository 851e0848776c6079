//! Error classification for retry logic.
//!
//! Errors in this crate self-describe their characteristics so that callers
//! can make generic retry decisions. The writer itself never retries; retry
//! policy belongs to whoever invokes it (see `cli::ingest`).

use std::time::Duration;

/// Classification of error types for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient errors that may resolve on retry (network issues, timeouts)
    Transient,
    /// Permanent errors that won't resolve on retry (invalid input, not found)
    Permanent,
    /// Resource exhaustion errors (rate limits, pool exhausted)
    ResourceExhausted,
    /// Configuration errors (missing config, invalid settings)
    Configuration,
}

/// Trait for errors that can classify themselves for retry logic.
pub trait ErrorClassification {
    /// Returns the category of this error
    fn category(&self) -> ErrorCategory;

    /// Returns true if this error is transient and may succeed on retry
    fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::ResourceExhausted
        )
    }

    /// Returns true if this error is permanent and won't succeed on retry
    fn is_permanent(&self) -> bool {
        matches!(self.category(), ErrorCategory::Permanent)
    }

    /// Suggests a delay before retrying, if applicable
    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self.category() {
            ErrorCategory::Transient => Some(Duration::from_millis(100)),
            ErrorCategory::ResourceExhausted => Some(Duration::from_secs(1)),
            _ => None,
        }
    }

    /// Returns the maximum number of retries suggested for this error
    fn max_retries(&self) -> u32 {
        match self.category() {
            ErrorCategory::Transient => 3,
            ErrorCategory::ResourceExhausted => 5,
            _ => 0,
        }
    }
}

/// Helper function for retry logic with exponential backoff.
///
/// Retries only while the error reports itself transient; permanent and
/// configuration errors are returned immediately.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    initial_delay: Duration,
) -> Result<T, E>
where
    E: ErrorClassification + std::fmt::Debug,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempts = 0;
    let mut delay = initial_delay;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts += 1;

                if !err.is_transient() || attempts >= max_attempts {
                    return Err(err);
                }

                let retry_delay = err.suggested_retry_delay().unwrap_or(delay);
                tokio::time::sleep(retry_delay).await;

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct FakeError(ErrorCategory);

    impl ErrorClassification for FakeError {
        fn category(&self) -> ErrorCategory {
            self.0
        }
    }

    #[test]
    fn test_transient_classification() {
        let err = FakeError(ErrorCategory::Transient);
        assert!(err.is_transient());
        assert!(!err.is_permanent());
        assert!(err.suggested_retry_delay().is_some());
        assert_eq!(err.max_retries(), 3);
    }

    #[test]
    fn test_permanent_classification() {
        let err = FakeError(ErrorCategory::Permanent);
        assert!(!err.is_transient());
        assert!(err.is_permanent());
        assert_eq!(err.suggested_retry_delay(), None);
        assert_eq!(err.max_retries(), 0);
    }

    #[tokio::test]
    async fn test_retry_gives_up_on_permanent() {
        let calls = Cell::new(0u32);
        let result: Result<(), FakeError> = retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                async { Err(FakeError(ErrorCategory::Permanent)) }
            },
            5,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retry_exhausts_attempts_on_transient() {
        let calls = Cell::new(0u32);
        let result: Result<(), FakeError> = retry_with_backoff(
            || {
                calls.set(calls.get() + 1);
                async { Err(FakeError(ErrorCategory::Transient)) }
            },
            3,
            Duration::from_millis(1),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }
}
