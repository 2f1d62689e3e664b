//! Retry capability.

use std::sync::Arc;
use std::time::Duration;

use crate::Error;

/// Capability deciding whether a failed attempt should be retried.
pub trait Retry: Send + Sync {
    /// Given the attempt number (1-based, counting the attempt that just
    /// failed) and its error, return how long to wait before retrying, or
    /// `None` to give up.
    fn backoff(&self, attempt: u32, error: &Error) -> Option<Duration>;
}

/// Shared handle to a [`Retry`] policy.
pub type SharedRetry = Arc<dyn Retry>;

/// Produces per-service retry policies.
///
/// When configured, a load-balanced client is decorated with the policy this
/// factory creates for its service name.
pub trait RetryFactory: Send + Sync {
    /// Create a retry policy for the named service.
    fn create(&self, service_name: &str) -> SharedRetry;
}

/// Shared handle to a [`RetryFactory`].
pub type SharedRetryFactory = Arc<dyn RetryFactory>;

/// The default policy: never retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl Retry for NeverRetry {
    fn backoff(&self, _attempt: u32, _error: &Error) -> Option<Duration> {
        None
    }
}

/// Fixed-delay policy retrying connection errors, timeouts, and 5xx
/// responses up to `max_attempts` total attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    max_attempts: u32,
    delay: Duration,
}

impl FixedBackoff {
    /// Create a policy allowing `max_attempts` total attempts with a fixed
    /// delay between them.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn is_retryable(error: &Error) -> bool {
        error.is_connection() || error.is_timeout() || error.is_server_error()
    }
}

impl Retry for FixedBackoff {
    fn backoff(&self, attempt: u32, error: &Error) -> Option<Duration> {
        if attempt >= self.max_attempts || !Self::is_retryable(error) {
            return None;
        }
        Some(self.delay)
    }
}
