//! Error types for clasp.
//!
//! Configuration and target-resolution failures ([`Error::Configuration`],
//! [`Error::NoLoadBalancerAvailable`]) are raised eagerly while a client is
//! being built. Everything else originates in the transport and propagates
//! unchanged through the resolved client.

use std::sync::Arc;

use bytes::Bytes;
use derive_more::{Display, Error, From};

use crate::Response;

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for clasp operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Malformed or missing required configuration (blank context id or
    /// service name, invalid fallback designation, malformed explicit URL).
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Configuration(#[error(not(source))] String),

    /// Load-balanced dispatch was required but no load-balancing client is
    /// registered in the service's scope.
    #[display("no load-balancing client registered for service '{service}'")]
    #[from(skip)]
    NoLoadBalancerAvailable {
        /// Service name that required load balancing.
        service: String,
    },

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request construction.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// All retry attempts were consumed without a successful response.
    #[display("retries exhausted after {attempts} attempts: {cause}")]
    #[from(skip)]
    RetriesExhausted {
        /// Number of attempts made, including the first.
        attempts: u32,
        /// The error returned by the final attempt.
        #[error(not(source))]
        cause: Box<Error>,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "order.customer.id").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a no-load-balancer error for a service.
    #[must_use]
    pub fn no_load_balancer(service: impl Into<String>) -> Self {
        Self::NoLoadBalancerAvailable {
            service: service.into(),
        }
    }

    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if this error was raised while building a client
    /// rather than while executing a call.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::NoLoadBalancerAvailable { .. }
        )
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Unwrap a retry wrapper down to the last attempt's error.
    ///
    /// Non-wrapped errors are returned unchanged.
    #[must_use]
    pub fn into_cause(self) -> Self {
        match self {
            Self::RetriesExhausted { cause, .. } => *cause,
            other => other,
        }
    }
}

// ============================================================================
// Error Decoder Capability
// ============================================================================

/// Capability for turning a non-successful HTTP response into an [`Error`].
///
/// The resolved configuration selects one decoder per service; the decoder
/// receives the target key (service name) and the full buffered response.
pub trait ErrorDecoder: Send + Sync {
    /// Decode a non-2xx response into an error.
    fn decode(&self, target: &str, response: &Response<Bytes>) -> Error;
}

/// Shared handle to an [`ErrorDecoder`].
pub type SharedErrorDecoder = Arc<dyn ErrorDecoder>;

/// Capability for producing per-service error decoders.
///
/// Consulted only when no [`ErrorDecoder`] instance is registered for the
/// scope; an explicit instance always wins over a factory-produced one.
pub trait ErrorDecoderFactory: Send + Sync {
    /// Create an error decoder for the named service.
    fn create(&self, service_name: &str) -> SharedErrorDecoder;
}

/// Shared handle to an [`ErrorDecoderFactory`].
pub type SharedErrorDecoderFactory = Arc<dyn ErrorDecoderFactory>;

/// Default error decoder mapping the response status to [`Error::Http`],
/// preserving the response body for callers that want to inspect it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusErrorDecoder;

impl ErrorDecoder for StatusErrorDecoder {
    fn decode(&self, target: &str, response: &Response<Bytes>) -> Error {
        let status = response.status();
        let body = response.body().clone();
        if body.is_empty() {
            Error::http(status, format!("{target} returned status {status}"))
        } else {
            Error::http_with_body(status, format!("{target} returned status {status}"), body)
        }
    }
}
