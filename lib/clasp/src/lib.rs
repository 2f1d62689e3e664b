//! Declarative HTTP clients with per-service configuration resolution.
//!
//! clasp builds resolved service clients from three ingredients:
//! - a [`ScopeRegistry`] of declared capabilities, one named scope per
//!   service plus a shared root scope
//! - externally supplied [`ClientProperties`], keyed by context id
//! - a [`ServiceDescriptor`] naming the service and its target
//!
//! The [`ServiceClientFactory`] merges the sources deterministically,
//! constructs the target (load balanced by service name, or pinned to an
//! explicit URL), and assembles a [`ServiceClient`] ready to execute
//! endpoint calls.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clasp::prelude::*;
//!
//! # async fn example() -> clasp::Result<()> {
//! let registry = ScopeRegistry::new();
//! let factory = ServiceClientFactory::new(Arc::new(registry), ClientProperties::new());
//!
//! let descriptor = ServiceDescriptor::new("orders").with_url("http://orders.internal:8080");
//! let client = factory.build(&descriptor)?;
//!
//! let response = client.call(&Endpoint::get("/v1/orders/{id}").path_param("id", 42)).await?;
//! let order: serde_json::Value = response.json()?;
//! # let _ = order;
//! # Ok(())
//! # }
//! ```

mod builder;
mod client;
mod connector;
mod descriptor;
mod factory;
mod lb;
pub mod prelude;
mod properties;
mod resolve;
mod scope;
mod service_client;
mod target;

pub use builder::ClientBuilder;
pub use client::HyperClient;
pub use connector::https_connector;
pub use descriptor::ServiceDescriptor;
pub use factory::ServiceClientFactory;
pub use lb::{LoadBalancedClient, LoadBalancedClientCache, ServiceLoadBalancer};
pub use properties::{ClientProperties, DEFAULT_CONFIG_KEY, ServiceProperties};
pub use resolve::{ConfigResolver, ResolvedClientSpec, merge_timeouts};
pub use scope::{NamedScope, ScopeRegistry};
pub use service_client::ServiceClient;
pub use target::{ClientHandle, ResolvedTarget, Target, TargetResolver, ensure_scheme};

// Re-export the core vocabulary so most users need a single dependency.
pub use clasp_core::{
    ContentType, Contract, Decoder, DefaultContract, DefaultServerIntrospector, Encoder, Endpoint,
    Error, ErrorDecoder, ErrorDecoderFactory, ExceptionPropagationPolicy, Fallback,
    FallbackFactory, FixedBackoff, FormEncoder, HeaderInterceptor, HttpClient, JsonDecoder,
    JsonEncoder, LbClientConfig, LoadBalancerRegistry, LogLevel, Method, NeverRetry,
    PathTemplate, QueryInterceptor, QueryMapEncoder, Request, RequestInterceptor, RequestOptions,
    RequestTemplate, Response, Result, Retry, RetryFactory, RoundRobinSelector, ServerInstance,
    ServerIntrospector, ServerSelector, SharedContract, SharedDecoder, SharedEncoder,
    SharedErrorDecoder, SharedErrorDecoderFactory, SharedFallback, SharedFallbackFactory,
    SharedHttpClient, SharedInterceptor, SharedLoadBalancerRegistry, SharedQueryMapEncoder,
    SharedRetry, SharedRetryFactory, SharedServerIntrospector, SharedServerSelector,
    SortedQueryMapEncoder, StaticLoadBalancerRegistry, StatusErrorDecoder,
};
