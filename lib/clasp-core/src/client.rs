//! HTTP client and fallback capability traits.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Error, Request, RequestOptions, Response, Result};

/// Direct-execution HTTP client capability.
///
/// This is the transport seam: implementations perform the actual network
/// call. The trait is object-safe so resolved clients, load-balancing
/// decorators, and test doubles can all be carried as [`SharedHttpClient`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason: network errors,
    /// TLS errors, timeouts, or an invalid request.
    async fn execute(
        &self,
        request: Request<Bytes>,
        options: &RequestOptions,
    ) -> Result<Response<Bytes>>;
}

/// Shared handle to an [`HttpClient`].
pub type SharedHttpClient = Arc<dyn HttpClient>;

/// Concrete fallback for a service: answers in place of the remote when a
/// call finally fails.
///
/// A descriptor naming a fallback must point at a registered implementation,
/// validated eagerly at build time. The resolved client invokes it after
/// retries are exhausted.
pub trait Fallback: Send + Sync {
    /// Produce a substitute response for a failed call.
    fn handle(&self, target: &str, error: Error) -> Result<Response<Bytes>>;
}

/// Shared handle to a [`Fallback`].
pub type SharedFallback = Arc<dyn Fallback>;

/// Produces per-service fallbacks.
pub trait FallbackFactory: Send + Sync {
    /// Create a fallback for the named service.
    fn create(&self, service_name: &str) -> SharedFallback;
}

/// Shared handle to a [`FallbackFactory`].
pub type SharedFallbackFactory = Arc<dyn FallbackFactory>;
