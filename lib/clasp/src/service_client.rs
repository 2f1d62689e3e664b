//! The resolved client: executes endpoint calls against a target with the
//! merged configuration baked in.

use std::time::Instant;

use bytes::Bytes;
use clasp_core::{
    Endpoint, Error, ExceptionPropagationPolicy, LogLevel, RequestTemplate, Response, Result,
    SharedFallback, SharedHttpClient,
};
use tracing::{debug, info};

use crate::resolve::ResolvedClientSpec;
use crate::target::Target;

/// A client bound to one target with a fully resolved configuration.
///
/// Construction happens through the factory; after that every call follows
/// the same pipeline: contract parse, interceptors, template resolution,
/// transport execute, decode or error-decode, retry, fallback.
pub struct ServiceClient {
    target: Target,
    transport: SharedHttpClient,
    spec: ResolvedClientSpec,
    fallback: Option<SharedFallback>,
}

impl ServiceClient {
    pub(crate) fn new(
        target: Target,
        transport: SharedHttpClient,
        spec: ResolvedClientSpec,
        fallback: Option<SharedFallback>,
    ) -> Self {
        Self {
            target,
            transport,
            spec,
            fallback,
        }
    }

    /// Where this client sends requests.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// The merged configuration this client runs with.
    #[must_use]
    pub const fn spec(&self) -> &ResolvedClientSpec {
        &self.spec
    }

    /// Execute an endpoint without a body.
    ///
    /// # Errors
    ///
    /// Returns the decoded error for non-2xx responses, transport errors,
    /// or [`Error::RetriesExhausted`] when a retry policy gave up.
    pub async fn call(&self, endpoint: &Endpoint) -> Result<Response<Bytes>> {
        let template = self.spec.contract.parse(endpoint)?;
        self.send(template).await
    }

    /// Execute an endpoint with a serializable body, encoded through the
    /// resolved encoder.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call), plus serialization errors.
    pub async fn call_with_body<T: serde::Serialize>(
        &self,
        endpoint: &Endpoint,
        body: &T,
    ) -> Result<Response<Bytes>> {
        let mut template = self.spec.contract.parse(endpoint)?;
        let value = serde_json::to_value(body)?;
        self.spec.encoder.encode(&value, &mut template)?;
        self.send(template).await
    }

    /// Execute a prepared template through the full pipeline.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    pub async fn send(&self, mut template: RequestTemplate) -> Result<Response<Bytes>> {
        for interceptor in &self.spec.interceptors {
            interceptor.apply(&mut template);
        }
        let query_map = template.take_query_map();
        if !query_map.is_empty() {
            for (name, value) in self.spec.query_map_encoder.encode(&query_map) {
                template.query(name, value);
            }
        }

        let request = template.resolve(self.target.url())?;

        let mut attempt: u32 = 0;
        let error = loop {
            attempt += 1;
            let started = Instant::now();
            let outcome = self
                .transport
                .execute(request.clone(), &self.spec.options)
                .await;
            let error = match outcome {
                Ok(response) => {
                    self.log_response(&request, &response, started);
                    if response.is_success()
                        || (response.status() == 404 && self.spec.decode_not_found)
                    {
                        return self.spec.decoder.decode(response);
                    }
                    self.spec
                        .error_decoder
                        .decode(self.target.service_name(), &response)
                }
                Err(error) => error,
            };
            let Some(delay) = self.spec.retry.backoff(attempt, &error) else {
                break error;
            };
            debug!(
                target = self.target.service_name(),
                attempt,
                error = %error,
                "retrying call"
            );
            tokio::time::sleep(delay).await;
        };

        let error = self.wrap_error(error, attempt);
        match &self.fallback {
            Some(fallback) => fallback.handle(self.target.service_name(), error),
            None => Err(error),
        }
    }

    fn wrap_error(&self, error: Error, attempts: u32) -> Error {
        if attempts <= 1 {
            return error;
        }
        match self.spec.propagation_policy {
            ExceptionPropagationPolicy::None => Error::RetriesExhausted {
                attempts,
                cause: Box::new(error),
            },
            ExceptionPropagationPolicy::Unwrap => error.into_cause(),
        }
    }

    fn log_response(
        &self,
        request: &clasp_core::Request<Bytes>,
        response: &Response<Bytes>,
        started: Instant,
    ) {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match self.spec.log_level {
            LogLevel::None => {}
            LogLevel::Basic => {
                info!(
                    target_name = self.target.service_name(),
                    method = %request.method(),
                    url = %request.url(),
                    status = response.status(),
                    elapsed_ms,
                    "call completed"
                );
            }
            LogLevel::Headers | LogLevel::Full => {
                debug!(
                    target_name = self.target.service_name(),
                    method = %request.method(),
                    url = %request.url(),
                    status = response.status(),
                    elapsed_ms,
                    request_headers = request.headers().len(),
                    response_headers = response.headers().len(),
                    body_bytes = response.body().len(),
                    "call completed"
                );
            }
        }
    }
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("target", &self.target)
            .field("spec", &self.spec)
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}
