//! The client factory: descriptor in, fully resolved client out.

use std::sync::Arc;

use clasp_core::{Error, Result, SharedFallback, SharedFallbackFactory};
use tracing::debug;

use crate::builder::ClientBuilder;
use crate::descriptor::ServiceDescriptor;
use crate::properties::ClientProperties;
use crate::resolve::ConfigResolver;
use crate::scope::ScopeRegistry;
use crate::service_client::ServiceClient;
use crate::target::TargetResolver;

/// Builds [`ServiceClient`]s from descriptors.
///
/// The factory owns the scope registry and property set; both are frozen at
/// construction, so building clients is a read-only, deterministic
/// operation safe to call from any thread.
pub struct ServiceClientFactory {
    registry: Arc<ScopeRegistry>,
    properties: ClientProperties,
}

impl ServiceClientFactory {
    /// Create a factory over a frozen registry and property set.
    #[must_use]
    pub const fn new(registry: Arc<ScopeRegistry>, properties: ClientProperties) -> Self {
        Self {
            registry,
            properties,
        }
    }

    /// The scope registry this factory resolves against.
    #[must_use]
    pub fn registry(&self) -> &ScopeRegistry {
        &self.registry
    }

    /// Build a client for `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for invalid descriptors or fallback
    /// designations, and [`Error::NoLoadBalancerAvailable`] when a URL-less
    /// descriptor has no load-balancing transport in scope.
    pub fn build(&self, descriptor: &ServiceDescriptor) -> Result<ServiceClient> {
        descriptor.validate()?;
        let fallback = self.resolve_fallback(descriptor)?;

        let spec = ConfigResolver::new(&self.registry, &self.properties).resolve(descriptor);
        let resolved = TargetResolver::new(&self.registry).resolve(descriptor)?;
        debug!(
            service = descriptor.service_name(),
            context = descriptor.context_id(),
            url = resolved.target.url(),
            "built service client"
        );

        let mut builder = ClientBuilder::new(spec, resolved);
        if let Some(fallback) = fallback {
            builder = builder.fallback(fallback);
        }
        Ok(builder.build())
    }

    /// Resolve the fallback designation, if any.
    ///
    /// A designation must name a registered handler; a blank name or a
    /// missing registration is a configuration error, caught here rather
    /// than at call time.
    fn resolve_fallback(&self, descriptor: &ServiceDescriptor) -> Result<Option<SharedFallback>> {
        let context_id = descriptor.context_id();

        if let Some(name) = descriptor.fallback() {
            if name.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "fallback name must not be blank for service '{}'",
                    descriptor.service_name()
                )));
            }
            let fallback = self
                .registry
                .get_named_instance::<SharedFallback>(context_id, name)
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "fallback '{name}' is not registered for service '{}'",
                        descriptor.service_name()
                    ))
                })?;
            return Ok(Some(fallback));
        }

        if let Some(name) = descriptor.fallback_factory() {
            if name.trim().is_empty() {
                return Err(Error::configuration(format!(
                    "fallback factory name must not be blank for service '{}'",
                    descriptor.service_name()
                )));
            }
            let factory = self
                .registry
                .get_named_instance::<SharedFallbackFactory>(context_id, name)
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "fallback factory '{name}' is not registered for service '{}'",
                        descriptor.service_name()
                    ))
                })?;
            return Ok(Some(factory.create(descriptor.service_name())));
        }

        Ok(None)
    }
}

impl std::fmt::Debug for ServiceClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClientFactory")
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
