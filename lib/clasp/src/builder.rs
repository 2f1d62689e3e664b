//! Final client assembly.

use clasp_core::{
    RequestOptions, SharedErrorDecoder, SharedFallback, SharedHttpClient, SharedInterceptor,
    SharedRetry,
};

use crate::resolve::ResolvedClientSpec;
use crate::service_client::ServiceClient;
use crate::target::ResolvedTarget;

/// Assembles a [`ServiceClient`] from a resolved configuration and target.
///
/// The builder is pure assembly: resolution decided everything, and the
/// `with_*` overrides exist for callers that construct clients by hand.
/// Building is idempotent, the same inputs always produce an equivalently
/// configured client.
pub struct ClientBuilder {
    spec: ResolvedClientSpec,
    resolved: ResolvedTarget,
    fallback: Option<SharedFallback>,
}

impl ClientBuilder {
    /// Start from a resolved configuration and target.
    #[must_use]
    pub const fn new(spec: ResolvedClientSpec, resolved: ResolvedTarget) -> Self {
        Self {
            spec,
            resolved,
            fallback: None,
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: SharedRetry) -> Self {
        self.spec.retry = retry;
        self
    }

    /// Override the error decoder.
    #[must_use]
    pub fn error_decoder(mut self, decoder: SharedErrorDecoder) -> Self {
        self.spec.error_decoder = decoder;
        self
    }

    /// Override the transport options.
    #[must_use]
    pub const fn options(mut self, options: RequestOptions) -> Self {
        self.spec.options = options;
        self
    }

    /// Append an interceptor after the resolved ones.
    #[must_use]
    pub fn interceptor(mut self, interceptor: SharedInterceptor) -> Self {
        self.spec.interceptors.push(interceptor);
        self
    }

    /// Override the transport.
    #[must_use]
    pub fn transport(mut self, transport: SharedHttpClient) -> Self {
        self.resolved.transport = transport;
        self
    }

    /// Attach a fallback handler invoked when a call finally fails.
    #[must_use]
    pub fn fallback(mut self, fallback: SharedFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Assemble the client.
    #[must_use]
    pub fn build(self) -> ServiceClient {
        ServiceClient::new(
            self.resolved.target,
            self.resolved.transport,
            self.spec,
            self.fallback,
        )
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("target", &self.resolved.target)
            .field("spec", &self.spec)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
