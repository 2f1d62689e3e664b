//! Per-request transport options and call-behavior knobs.

use std::time::Duration;

/// Connect/read timeouts carried into the transport for each call.
///
/// `RequestOptions::default()` doubles as the "caller did not override"
/// sentinel: a load-balanced dispatch replaces default options with the
/// discovery-supplied per-service timeouts, but passes explicit options
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Maximum time to establish a connection.
    pub connect_timeout: Duration,
    /// Maximum time to wait for the full response.
    pub read_timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
        }
    }
}

impl RequestOptions {
    /// Create options with explicit connect/read timeouts.
    #[must_use]
    pub const fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    /// Returns `true` if these are the unmodified default options.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// How much a resolved client logs about each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No per-call logging.
    #[default]
    None,
    /// Method, URL, status, and elapsed time.
    Basic,
    /// Basic plus request/response headers.
    Headers,
    /// Headers plus body sizes.
    Full,
}

/// How errors produced by a retried call surface to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionPropagationPolicy {
    /// Keep the retry wrapper: the caller sees how many attempts were made.
    #[default]
    None,
    /// Unwrap to the last attempt's underlying error.
    Unwrap,
}
