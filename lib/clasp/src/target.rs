//! Target construction: turning a descriptor into a base URL plus the
//! transport that serves it.

use std::sync::Arc;

use clasp_core::{Error, Result, SharedHttpClient};
use url::Url;

use crate::client::HyperClient;
use crate::descriptor::ServiceDescriptor;
use crate::lb::LoadBalancedClient;
use crate::scope::ScopeRegistry;

/// A resolved destination: the logical service name and the exact base URL
/// every request template is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    service_name: String,
    url: String,
}

impl Target {
    /// Create a target.
    pub fn new(service_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            url: url.into(),
        }
    }

    /// The logical service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The base URL, exactly as constructed.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.service_name, self.url)
    }
}

/// The transport registered for a scope: either a plain client or a
/// load-balancing wrapper whose delegate can be unwrapped for direct calls.
#[derive(Clone)]
pub enum ClientHandle {
    /// A client that connects to whatever host the URL names.
    Direct(SharedHttpClient),
    /// A client that rewrites service-name hosts via discovery.
    LoadBalanced(Arc<LoadBalancedClient>),
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("ClientHandle::Direct"),
            Self::LoadBalanced(_) => f.write_str("ClientHandle::LoadBalanced"),
        }
    }
}

/// A constructed target and the transport that will serve it.
#[derive(Clone)]
pub struct ResolvedTarget {
    /// Where requests go.
    pub target: Target,
    /// The transport requests are executed on.
    pub transport: SharedHttpClient,
}

/// Prepend `http://` when the value carries no scheme.
#[must_use]
pub fn ensure_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// Decides, per descriptor, whether a client is load balanced or pinned to
/// an explicit URL, and picks the matching transport.
pub struct TargetResolver<'a> {
    registry: &'a ScopeRegistry,
}

impl<'a> TargetResolver<'a> {
    /// Create a resolver over a scope registry.
    #[must_use]
    pub const fn new(registry: &'a ScopeRegistry) -> Self {
        Self { registry }
    }

    /// Construct the target and transport for `descriptor`.
    ///
    /// Without an explicit URL the base URL is the service name itself and
    /// a load-balancing transport is mandatory. With an explicit URL any
    /// load-balancing wrapper in scope is unwrapped to its delegate so the
    /// service-name rewrite never happens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoLoadBalancerAvailable`] when no load-balancing
    /// transport is registered for a URL-less descriptor, and
    /// [`Error::Configuration`] when the constructed URL does not parse.
    pub fn resolve(&self, descriptor: &ServiceDescriptor) -> Result<ResolvedTarget> {
        let context_id = descriptor.context_id();
        let handle = self.registry.get_instance::<ClientHandle>(context_id);

        match descriptor.url() {
            None => {
                let base = format!(
                    "{}{}",
                    ensure_scheme(descriptor.service_name()),
                    descriptor.clean_path()
                );
                match handle {
                    Some(ClientHandle::LoadBalanced(lb)) => Ok(ResolvedTarget {
                        target: Target::new(descriptor.service_name(), base),
                        transport: lb,
                    }),
                    Some(ClientHandle::Direct(_)) | None => {
                        Err(Error::no_load_balancer(descriptor.service_name()))
                    }
                }
            }
            Some(url) => {
                let normalized = ensure_scheme(url);
                // A trailing slash on the explicit URL would double up with
                // the leading slash of the path prefix.
                let base = format!(
                    "{}{}",
                    normalized.trim_end_matches('/'),
                    descriptor.clean_path()
                );
                Url::parse(&base).map_err(|err| {
                    Error::configuration(format!(
                        "invalid url '{base}' for service '{}': {err}",
                        descriptor.service_name()
                    ))
                })?;
                let transport: SharedHttpClient = match handle {
                    Some(ClientHandle::LoadBalanced(lb)) => lb.delegate(),
                    Some(ClientHandle::Direct(client)) => client,
                    None => Arc::new(HyperClient::new()),
                };
                Ok(ResolvedTarget {
                    target: Target::new(descriptor.service_name(), base),
                    transport,
                })
            }
        }
    }
}
