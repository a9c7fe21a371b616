//! Async testing utilities
//!
//! Helpers for waiting on conditions driven by spawned tasks.

// Allow missing error/panic docs for test utilities - they are designed to be self-explanatory
// and are used in test contexts where comprehensive documentation is less critical
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::future::Future;
use std::time::Duration;

/// Interval used by [`wait_until`]
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Wait for a future to complete with a timeout, returning a Result
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use authpipe_common::testing::async_utils::timeout_ok;
///
/// #[tokio::test]
/// async fn test_timeout() {
///     let result = timeout_ok(Duration::from_millis(100), async { 42 }).await;
///     assert_eq!(result.unwrap(), 42);
/// }
/// ```
pub async fn timeout_ok<F, T>(duration: Duration, fut: F) -> Result<T, tokio::time::error::Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, fut).await
}

/// Poll an async condition until it returns true or the timeout expires
///
/// Returns whether the condition was met.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(interval).await;
    }

    condition().await
}

/// Poll a synchronous condition, such as a mock's call counter, until it
/// holds or `timeout` expires
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use authpipe_common::testing::{wait_until, MockTransport};
///
/// # async fn demo(transport: MockTransport) {
/// assert!(wait_until(Duration::from_secs(1), || transport.call_count() == 2).await);
/// # }
/// ```
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    poll_until(timeout, POLL_INTERVAL, || std::future::ready(condition())).await
}
