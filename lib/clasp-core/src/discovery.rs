//! Service-discovery boundary.
//!
//! The load-balancing layer consumes these capabilities without knowing how
//! servers are discovered or selected. [`StaticLoadBalancerRegistry`] is the
//! bundled implementation for fixed server lists and tests; real discovery
//! backends implement [`LoadBalancerRegistry`] themselves.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::RequestOptions;

/// One selectable backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInstance {
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Whether the server expects TLS.
    pub secure: bool,
}

impl ServerInstance {
    /// Create a plain (non-TLS) server instance.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
        }
    }

    /// Mark the server as TLS-terminated.
    #[must_use]
    pub const fn secure(mut self) -> Self {
        self.secure = true;
        self
    }
}

/// Server-selection strategy for one service.
pub trait ServerSelector: Send + Sync {
    /// Choose a server for the next call, or `None` if none are available.
    fn choose(&self, service_name: &str) -> Option<ServerInstance>;
}

/// Shared handle to a [`ServerSelector`].
pub type SharedServerSelector = Arc<dyn ServerSelector>;

/// Inspects a selected server to determine routing metadata.
pub trait ServerIntrospector: Send + Sync {
    /// Whether calls to this server must use `https`.
    fn is_secure(&self, server: &ServerInstance) -> bool;
}

/// Shared handle to a [`ServerIntrospector`].
pub type SharedServerIntrospector = Arc<dyn ServerIntrospector>;

/// Default introspector: trusts the server's own `secure` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultServerIntrospector;

impl ServerIntrospector for DefaultServerIntrospector {
    fn is_secure(&self, server: &ServerInstance) -> bool {
        server.secure
    }
}

/// Per-service transport defaults supplied by the discovery backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LbClientConfig {
    /// Connect timeout applied when the caller did not override options.
    pub connect_timeout: Duration,
    /// Read timeout applied when the caller did not override options.
    pub read_timeout: Duration,
}

impl Default for LbClientConfig {
    fn default() -> Self {
        let options = RequestOptions::default();
        Self {
            connect_timeout: options.connect_timeout,
            read_timeout: options.read_timeout,
        }
    }
}

/// Discovery backend: everything the load-balancing layer needs to build a
/// per-service balancer.
pub trait LoadBalancerRegistry: Send + Sync {
    /// Server-selection strategy for the named service.
    fn selector(&self, service_name: &str) -> SharedServerSelector;

    /// Transport defaults for the named service.
    fn client_config(&self, service_name: &str) -> LbClientConfig;

    /// Routing-metadata introspector for the named service.
    fn introspector(&self, service_name: &str) -> SharedServerIntrospector;
}

/// Shared handle to a [`LoadBalancerRegistry`].
pub type SharedLoadBalancerRegistry = Arc<dyn LoadBalancerRegistry>;

/// Round-robin selector over a fixed server list.
#[derive(Debug)]
pub struct RoundRobinSelector {
    servers: Vec<ServerInstance>,
    next: AtomicUsize,
}

impl RoundRobinSelector {
    /// Create a selector over the given servers.
    #[must_use]
    pub fn new(servers: Vec<ServerInstance>) -> Self {
        Self {
            servers,
            next: AtomicUsize::new(0),
        }
    }
}

impl ServerSelector for RoundRobinSelector {
    fn choose(&self, _service_name: &str) -> Option<ServerInstance> {
        if self.servers.is_empty() {
            return None;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.servers.len();
        self.servers.get(index).cloned()
    }
}

/// Fixed-table discovery backend: a server list and optional transport
/// defaults per service name.
#[derive(Default)]
pub struct StaticLoadBalancerRegistry {
    selectors: HashMap<String, SharedServerSelector>,
    configs: HashMap<String, LbClientConfig>,
}

impl StaticLoadBalancerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a round-robin server list for a service.
    #[must_use]
    pub fn with_servers(mut self, service_name: impl Into<String>, servers: Vec<ServerInstance>) -> Self {
        self.selectors.insert(
            service_name.into(),
            Arc::new(RoundRobinSelector::new(servers)),
        );
        self
    }

    /// Register transport defaults for a service.
    #[must_use]
    pub fn with_config(mut self, service_name: impl Into<String>, config: LbClientConfig) -> Self {
        self.configs.insert(service_name.into(), config);
        self
    }
}

impl LoadBalancerRegistry for StaticLoadBalancerRegistry {
    fn selector(&self, service_name: &str) -> SharedServerSelector {
        self.selectors
            .get(service_name)
            .cloned()
            .unwrap_or_else(|| Arc::new(RoundRobinSelector::new(Vec::new())))
    }

    fn client_config(&self, service_name: &str) -> LbClientConfig {
        self.configs
            .get(service_name)
            .copied()
            .unwrap_or_default()
    }

    fn introspector(&self, _service_name: &str) -> SharedServerIntrospector {
        Arc::new(DefaultServerIntrospector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles() {
        let selector = RoundRobinSelector::new(vec![
            ServerInstance::new("a", 80),
            ServerInstance::new("b", 80),
        ]);

        let first = selector.choose("orders").expect("server");
        let second = selector.choose("orders").expect("server");
        let third = selector.choose("orders").expect("server");
        assert_eq!(first.host, "a");
        assert_eq!(second.host, "b");
        assert_eq!(third.host, "a");
    }

    #[test]
    fn round_robin_empty_list() {
        let selector = RoundRobinSelector::new(Vec::new());
        assert!(selector.choose("orders").is_none());
    }

    #[test]
    fn default_introspector_trusts_flag() {
        let introspector = DefaultServerIntrospector;
        assert!(introspector.is_secure(&ServerInstance::new("a", 443).secure()));
        assert!(!introspector.is_secure(&ServerInstance::new("a", 80)));
    }

    #[test]
    fn static_registry_serves_configured_services() {
        let registry = StaticLoadBalancerRegistry::new()
            .with_servers("orders", vec![ServerInstance::new("10.0.0.1", 8080)])
            .with_config(
                "orders",
                LbClientConfig {
                    connect_timeout: Duration::from_secs(1),
                    read_timeout: Duration::from_secs(2),
                },
            );

        let server = registry.selector("orders").choose("orders").expect("server");
        assert_eq!(server.port, 8080);
        assert_eq!(
            registry.client_config("orders").read_timeout,
            Duration::from_secs(2)
        );

        // Unknown services get an empty selector and default config.
        assert!(registry.selector("billing").choose("billing").is_none());
        assert_eq!(registry.client_config("billing"), LbClientConfig::default());
    }
}
