//! Load-balanced execution: service-name URL rewriting plus the lazy
//! per-service balancer cache.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use clasp_core::{
    Error, HttpClient, LbClientConfig, Request, RequestOptions, Response, Result,
    ServerInstance, SharedHttpClient, SharedLoadBalancerRegistry, SharedRetry,
    SharedRetryFactory, SharedServerIntrospector, SharedServerSelector,
};
use tracing::debug;

/// An [`HttpClient`] that treats the request host as a logical service name,
/// picks a concrete server through discovery, and delegates the rewritten
/// request to the wrapped transport.
pub struct LoadBalancedClient {
    delegate: SharedHttpClient,
    cache: LoadBalancedClientCache,
}

impl LoadBalancedClient {
    /// Wrap a transport with load balancing.
    #[must_use]
    pub const fn new(delegate: SharedHttpClient, cache: LoadBalancedClientCache) -> Self {
        Self { delegate, cache }
    }

    /// The wrapped transport, for callers that bypass load balancing.
    #[must_use]
    pub fn delegate(&self) -> SharedHttpClient {
        Arc::clone(&self.delegate)
    }

    /// The per-service balancer cache.
    #[must_use]
    pub const fn cache(&self) -> &LoadBalancedClientCache {
        &self.cache
    }
}

impl std::fmt::Debug for LoadBalancedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancedClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpClient for LoadBalancedClient {
    async fn execute(
        &self,
        request: Request<Bytes>,
        options: &RequestOptions,
    ) -> Result<Response<Bytes>> {
        let service_name = request
            .url()
            .host_str()
            .ok_or_else(|| Error::invalid_request("request url has no host"))?
            .to_string();
        let balancer = self.cache.get_or_create(&service_name);
        balancer
            .execute(self.delegate.as_ref(), request, options)
            .await
    }
}

/// Lazily built, per-service [`ServiceLoadBalancer`]s.
///
/// The first request for a service constructs its balancer; concurrent
/// first requests construct it at most once. Balancers live for the life of
/// the cache.
pub struct LoadBalancedClientCache {
    discovery: SharedLoadBalancerRegistry,
    retry_factory: Option<SharedRetryFactory>,
    entries: Mutex<HashMap<String, Arc<ServiceLoadBalancer>>>,
}

impl LoadBalancedClientCache {
    /// Create a cache over a discovery registry. When a retry factory is
    /// supplied, every balancer built by this cache is decorated with a
    /// retry policy from it.
    #[must_use]
    pub fn new(
        discovery: SharedLoadBalancerRegistry,
        retry_factory: Option<SharedRetryFactory>,
    ) -> Self {
        Self {
            discovery,
            retry_factory,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The balancer for `service_name`, building it on first use.
    #[must_use]
    pub fn get_or_create(&self, service_name: &str) -> Arc<ServiceLoadBalancer> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.entry(service_name.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                debug!(service = service_name, "building load balancer");
                let balancer = Arc::new(ServiceLoadBalancer::new(
                    service_name,
                    self.discovery.selector(service_name),
                    self.discovery.client_config(service_name),
                    self.discovery.introspector(service_name),
                    self.retry_factory
                        .as_ref()
                        .map(|factory| factory.create(service_name)),
                ));
                Arc::clone(entry.insert(balancer))
            }
        }
    }

    /// Number of cached balancers.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Whether no balancer has been built yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for LoadBalancedClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancedClientCache")
            .field("entries", &self.len())
            .field("retry_decorated", &self.retry_factory.is_some())
            .finish()
    }
}

/// Per-service balancer: server choice, URL rewrite, timeout substitution,
/// and optional retry across attempts.
pub struct ServiceLoadBalancer {
    service_name: String,
    selector: SharedServerSelector,
    config: LbClientConfig,
    introspector: SharedServerIntrospector,
    retry: Option<SharedRetry>,
}

impl ServiceLoadBalancer {
    fn new(
        service_name: &str,
        selector: SharedServerSelector,
        config: LbClientConfig,
        introspector: SharedServerIntrospector,
        retry: Option<SharedRetry>,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            selector,
            config,
            introspector,
            retry,
        }
    }

    /// The per-service timeouts supplied by discovery.
    #[must_use]
    pub const fn config(&self) -> &LbClientConfig {
        &self.config
    }

    /// Whether this balancer retries failed attempts.
    #[must_use]
    pub const fn has_retry(&self) -> bool {
        self.retry.is_some()
    }

    /// Execute one logical request, choosing a fresh server per attempt.
    ///
    /// Default options are replaced with the discovery-supplied timeouts;
    /// explicitly overridden options pass through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when discovery yields no server, or
    /// whatever the delegate's final attempt returned.
    pub async fn execute(
        &self,
        delegate: &dyn HttpClient,
        request: Request<Bytes>,
        options: &RequestOptions,
    ) -> Result<Response<Bytes>> {
        let effective = if options.is_default() {
            RequestOptions::new(self.config.connect_timeout, self.config.read_timeout)
        } else {
            *options
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let outcome = self.execute_once(delegate, request.clone(), &effective).await;
            let error = match outcome {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };
            let Some(delay) = self
                .retry
                .as_ref()
                .and_then(|retry| retry.backoff(attempt, &error))
            else {
                return Err(error);
            };
            debug!(
                service = self.service_name,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying after failed attempt"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn execute_once(
        &self,
        delegate: &dyn HttpClient,
        request: Request<Bytes>,
        options: &RequestOptions,
    ) -> Result<Response<Bytes>> {
        let server = self.selector.choose(&self.service_name).ok_or_else(|| {
            Error::connection(format!(
                "no servers available for service '{}'",
                self.service_name
            ))
        })?;
        let request = self.rewrite_url(request, &server)?;
        delegate.execute(request, options).await
    }

    fn rewrite_url(&self, request: Request<Bytes>, server: &ServerInstance) -> Result<Request<Bytes>> {
        let (method, mut url, headers, body) = request.into_parts();
        let scheme = if self.introspector.is_secure(server) {
            "https"
        } else {
            "http"
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::invalid_request(format!("cannot set scheme '{scheme}'")))?;
        url.set_host(Some(&server.host))
            .map_err(|err| Error::invalid_request(format!("cannot set host: {err}")))?;
        url.set_port(Some(server.port))
            .map_err(|()| Error::invalid_request("cannot set port on url"))?;
        Ok(Request::from_parts(method, url, headers, body))
    }
}

impl std::fmt::Debug for ServiceLoadBalancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLoadBalancer")
            .field("service_name", &self.service_name)
            .field("config", &self.config)
            .field("retry", &self.retry.is_some())
            .finish_non_exhaustive()
    }
}
